/*!

Flattened construction-time configuration, grounded on the
`ConfigurationValue` tree the teacher threads through every builder in
`config_parser.rs`/`*Builder` constructors, narrowed to a plain struct
since this simulator has a fixed component graph (mesh + Garnet router
+ SPIN) rather than a pluggable one: there is no tree of named object
references to resolve, just the scalars those objects would have read
out of it.

*/

use crate::direction::Direction;
use crate::error::{self, Error};
use crate::event::Time;

/// Everything needed to build a `GarnetNetwork` and size its routers.
#[derive(Debug,Clone)]
pub struct Params
{
	pub num_rows: usize,
	pub num_cols: usize,
	pub num_vnets: usize,
	/// Number of virtual channels in each virtual network, indexed by vnet.
	pub vcs_per_vnet: Vec<usize>,
	/// Flit buffer depth per virtual channel, shared by every vnet.
	pub buffer_depth: usize,
	/// Cycles a flit spends in flight on one `NetworkLink` hop.
	pub link_latency: Time,
	/// Cycles a flit spends in flight on an external (NI-facing) link.
	pub ext_link_latency: Time,

	pub spin_enabled: bool,
	/// SPIN fires every time `current_cycle % spin_threshold_cycles == 0`.
	pub spin_threshold_cycles: Time,
	/// Number of ring rotations per invocation; 0 means "uniformly random
	/// in [0,10)", resolved against `rng_seed` (§4.9 Open Question).
	pub spin_multiplicity: u32,
	/// Whether a rotation drains every VC on the ring's named inport, or
	/// only VC 0 (§4.9 Open Question: default false, matching gem5's
	/// single-VC-per-rotation sweep).
	pub spin_drain_all_vc: bool,
	pub rng_seed: u64,

	/// Simulation stops once the running average flit latency exceeds this.
	pub max_avg_flit_latency: f64,
	pub max_cycles: Time,
}

impl Params
{
	pub fn mesh(num_rows:usize, num_cols:usize, num_vnets:usize) -> Params
	{
		Params{
			num_rows, num_cols, num_vnets,
			vcs_per_vnet: vec![4;num_vnets],
			buffer_depth: 4,
			link_latency: 1,
			ext_link_latency: 1,
			spin_enabled: false,
			spin_threshold_cycles: 1000,
			spin_multiplicity: 1,
			spin_drain_all_vc: false,
			rng_seed: 0,
			max_avg_flit_latency: f64::INFINITY,
			max_cycles: 1_000_000,
		}
	}

	pub fn num_routers(&self) -> usize { self.num_rows*self.num_cols }

	pub fn total_vcs(&self) -> usize { self.vcs_per_vnet.iter().sum() }

	/// First VC index belonging to `vnet` in the flat `0..total_vcs()` space.
	pub fn vnet_vc_offset(&self, vnet:usize) -> usize
	{
		self.vcs_per_vnet[..vnet].iter().sum()
	}

	/// The VCs a SPIN rotation drains (§4.9 Open Question resolution): VC 0
	/// of every vnet unless `spin_drain_all_vc`, in which case every VC of
	/// every vnet.
	pub fn spin_selected_vcs(&self) -> Vec<usize>
	{
		if self.spin_drain_all_vc
		{
			(0..self.total_vcs()).collect()
		}
		else
		{
			(0..self.num_vnets).map(|v|self.vnet_vc_offset(v)).collect()
		}
	}

	pub fn validate(&self) -> Result<(),Error>
	{
		if self.num_rows==0 || self.num_cols==0
		{
			return Err(error!(invalid_params,"mesh dimensions must be positive".to_string()));
		}
		if self.vcs_per_vnet.len()!=self.num_vnets
		{
			return Err(error!(invalid_params,"vcs_per_vnet must have one entry per vnet".to_string()));
		}
		if self.vcs_per_vnet.iter().any(|&v|v==0)
		{
			return Err(error!(invalid_params,"every vnet needs at least one virtual channel".to_string()));
		}
		if self.link_latency==0 || self.ext_link_latency==0
		{
			return Err(error!(invalid_params,"link latency must be at least one cycle".to_string()));
		}
		if self.spin_enabled && self.spin_threshold_cycles==0
		{
			return Err(error!(invalid_params,"spin_threshold_cycles must be positive when SPIN is enabled".to_string()));
		}
		Ok(())
	}
}

/// Parses a whitespace-separated list of `(router_id,direction_token)`
/// pairs, as they arrive before `SpinRing::parse` adds the implicit first
/// node and checks closure (§6 ring file format). Exposed here since
/// `Params`'s caller is typically the one reading the ring off disk.
pub fn tokenize_ring(text:&str) -> Result<Vec<(usize,Direction)>,Error>
{
	let tokens:Vec<&str> = text.split_whitespace().collect();
	if tokens.len()%2!=0
	{
		return Err(error!(ill_formed_spin_ring,"ring description has an odd number of tokens".to_string()));
	}
	let mut nodes = Vec::with_capacity(tokens.len()/2);
	for pair in tokens.chunks(2)
	{
		let router_id:usize = pair[0].parse().map_err(|_|error!(ill_formed_spin_ring,format!("'{}' is not a router id",pair[0])))?;
		let direction = Direction::parse_ring_token(pair[1])?;
		nodes.push((router_id,direction));
	}
	Ok(nodes)
}

pub fn read_ring_file(path:&std::path::Path) -> Result<Vec<(usize,Direction)>,Error>
{
	let text = std::fs::read_to_string(path).map_err(|e|error!(could_not_open_file,path.to_path_buf(),e))?;
	tokenize_ring(&text)
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn rejects_zero_vcs()
	{
		let mut p = Params::mesh(2,2,1);
		p.vcs_per_vnet[0] = 0;
		assert!(p.validate().is_err());
	}

	#[test]
	fn tokenizes_pairs()
	{
		let nodes = tokenize_ring("1 E 3 N 2 W").unwrap();
		assert_eq!(nodes,vec![(1,Direction::East),(3,Direction::North),(2,Direction::West)]);
	}

	#[test]
	fn rejects_odd_token_count()
	{
		assert!(tokenize_ring("1 E 3").is_err());
	}

	#[test]
	fn spin_selected_vcs_defaults_to_one_per_vnet()
	{
		let mut p = Params::mesh(2,2,2);
		p.vcs_per_vnet = vec![2,3];
		assert_eq!(p.spin_selected_vcs(),vec![0,2]);
		p.spin_drain_all_vc = true;
		assert_eq!(p.spin_selected_vcs(),vec![0,1,2,3,4]);
	}
}
