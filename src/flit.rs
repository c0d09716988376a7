/*!

The flit, the smallest flow-control unit of a packet, and the route
information it carries. Grounded on the `Phit`/`Packet` split visible
throughout `router/basic.rs` (`Rc<Phit>`, `PacketRef`, `is_begin`), but
flattened to a single owned `Flit` value since Garnet routers reroute
and rewrite flits in place (notably during SPIN) rather than treating
them as immutable wire phits.

*/

use quantifiable_derive::Quantifiable;
use crate::direction::Direction;
use crate::event::Time;
use crate::quantify::Quantifiable;

/// A flit's position within its packet.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum FlitType
{
	Head,
	Body,
	Tail,
	/// A single-flit packet: both head and tail at once.
	HeadTail,
}

impl FlitType
{
	pub fn is_head(self) -> bool { matches!(self, FlitType::Head | FlitType::HeadTail) }
	pub fn is_tail(self) -> bool { matches!(self, FlitType::Tail | FlitType::HeadTail) }
}

impl Quantifiable for FlitType
{
	fn total_memory(&self) -> usize { std::mem::size_of::<FlitType>() }
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { std::mem::size_of::<FlitType>() }
}

impl Quantifiable for Stage
{
	fn total_memory(&self) -> usize { std::mem::size_of::<Stage>() }
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { std::mem::size_of::<Stage>() }
}

/// The five pipeline stages a flit passes through at a router, strictly
/// monotone during normal operation (Open Question resolution, §4.9/§9):
/// `RC < VA < SA < ST < LT`. SPIN resets a rotated flit's stage back to
/// `Sa` since re-insertion re-enters switch allocation, not route
/// computation (the route was already recomputed in the same step).
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord)]
pub enum Stage
{
	Rc,
	Va,
	Sa,
	St,
	Lt,
}

/// Destination bitmap used by table-driven routing (§4.1). Bit `i` set
/// means "router `i` (or NI `i`, depending on context) is a valid
/// destination of this flit's packet".
#[derive(Debug,Clone,PartialEq,Eq,Quantifiable)]
pub struct NetDest
{
	bits: Vec<bool>,
}

impl NetDest
{
	pub fn new(num_nodes:usize) -> NetDest
	{
		NetDest{ bits: vec![false;num_nodes] }
	}
	pub fn singleton(num_nodes:usize, node:usize) -> NetDest
	{
		let mut d = NetDest::new(num_nodes);
		d.add(node);
		d
	}
	pub fn add(&mut self, node:usize)
	{
		self.bits[node] = true;
	}
	pub fn contains(&self, node:usize) -> bool
	{
		self.bits[node]
	}
}

/// Destination NI id, destination/source router id, virtual network, and
/// the `net_dest` bitmap used by table-driven routing (§3).
#[derive(Debug,Clone,Quantifiable)]
pub struct RouteInfo
{
	pub dest_ni: usize,
	pub dest_router: usize,
	pub src_router: usize,
	pub vnet: usize,
	pub net_dest: NetDest,
}

/// The smallest flow-control unit of a packet.
#[derive(Debug,Clone,Quantifiable)]
pub struct Flit
{
	// --- immutable identity fields ---
	pub id: u64,
	pub pid: u64,
	pub vnet: usize,
	/// The VC this flit currently occupies at whichever InputUnit holds it.
	pub vc: usize,
	pub flit_type: FlitType,
	pub route: RouteInfo,
	pub size_flits: usize,
	/// Tagged for termination measurement (§4.10).
	pub is_marked: bool,
	/// The cycle this flit was injected into the network, for latency measurement.
	pub injection_cycle: Time,

	// --- mutable fields ---
	pub outport: Option<usize>,
	pub outport_dir: Option<Direction>,
	pub stage: Stage,
	pub stage_cycle: Time,
	pub hops: u32,
	/// Sentinel `-1` (modeled as `None`) when unset, per §3/§9.
	pub hops_needed_before_spin: Option<u32>,
	pub hops_needed_after_spin: Option<u32>,
}

impl Flit
{
	pub fn new(id:u64, pid:u64, vnet:usize, vc:usize, flit_type:FlitType, route:RouteInfo, size_flits:usize, is_marked:bool, injection_cycle:Time) -> Flit
	{
		Flit{
			id, pid, vnet, vc, flit_type, route, size_flits, is_marked, injection_cycle,
			outport: None,
			outport_dir: None,
			stage: Stage::Rc,
			stage_cycle: injection_cycle,
			hops: 0,
			hops_needed_before_spin: None,
			hops_needed_after_spin: None,
		}
	}

	/// Advance to a new pipeline stage. Panics (an `InvariantViolation`, in
	/// the taxonomy of §7) if asked to move stage non-monotonically during
	/// normal operation; SPIN bypasses this by writing `stage`/`stage_cycle`
	/// directly (see `spin.rs`), since it legitimately rewinds to `Sa`.
	pub fn advance_stage(&mut self, stage:Stage, cycle:Time)
	{
		assert!(stage >= self.stage, "flit stage must be monotone in normal operation: {:?} -> {:?}", self.stage, stage);
		self.stage = stage;
		self.stage_cycle = cycle;
	}

	pub fn is_head(&self) -> bool { self.flit_type.is_head() }
	pub fn is_tail(&self) -> bool { self.flit_type.is_tail() }
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn sample_route() -> RouteInfo
	{
		RouteInfo{ dest_ni:3, dest_router:3, src_router:0, vnet:0, net_dest: NetDest::singleton(4,3) }
	}

	#[test]
	fn stage_is_monotone()
	{
		let mut f = Flit::new(0,0,0,0,FlitType::Head,sample_route(),4,false,0);
		f.advance_stage(Stage::Va,1);
		f.advance_stage(Stage::Sa,2);
		assert_eq!(f.stage,Stage::Sa);
	}

	#[test]
	#[should_panic]
	fn stage_rejects_going_backwards()
	{
		let mut f = Flit::new(0,0,0,0,FlitType::Head,sample_route(),4,false,0);
		f.advance_stage(Stage::Sa,1);
		f.advance_stage(Stage::Rc,2);
	}

	#[test]
	fn head_tail_is_both()
	{
		assert!(FlitType::HeadTail.is_head());
		assert!(FlitType::HeadTail.is_tail());
		assert!(!FlitType::Body.is_head());
	}
}
