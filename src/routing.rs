/*!

Route computation (§4.1/§4.4), grounded on the `Routing` trait shape in
`routing/updown.rs` (`fn next(...) -> Result<RoutingNextCandidates,Error>`)
but narrowed from a generic pluggable-topology routing object to the
spec's deterministic XY mesh `RoutingUnit`. Maintains the bidirectional
`inport_dirn <-> index`/`outport_dirn <-> index` mappings and a
per-outport routing table the spec calls for, plus the *preferred set*
used by SPIN to tell forward-progress rotations from misroutes.

*/

use crate::direction::Direction;
use crate::flit::{Flit,NetDest};

/// Everything a `RoutingUnit` needs to know about the mesh: its
/// dimensions and this router's own (x,y) coordinate.
#[derive(Debug,Clone,Copy)]
pub struct MeshCoord
{
	pub x: usize,
	pub y: usize,
}

impl MeshCoord
{
	pub fn manhattan_distance(self, other:MeshCoord) -> u32
	{
		let dx = if self.x>other.x { self.x-other.x } else { other.x-self.x };
		let dy = if self.y>other.y { self.y-other.y } else { other.y-self.y };
		(dx+dy) as u32
	}
}

/// Computes next-hop outports for flits arriving at one router, fixed to
/// XY dimension-order routing on a rectangular mesh (§4.1: "for mesh
/// topologies, routing is XY").
pub struct RoutingUnit
{
	pub router_index: usize,
	pub coord: MeshCoord,
	pub num_rows: usize,
	pub num_cols: usize,
	/// `inport_dirn[port] = direction`, and its inverse.
	inport_dirn: Vec<Direction>,
	outport_dirn: Vec<Direction>,
	/// Per-outport link weight, used only to break ties deterministically (§4.4).
	outport_weight: Vec<u32>,
	/// Per-outport routing table entry (§4.1/§4.4): which destinations this
	/// outport is the table-driven choice for. Used by `lookup`.
	outport_table: Vec<NetDest>,
}

impl RoutingUnit
{
	/// Builds the routing unit for a mesh router at `(x,y)` with its
	/// five ports in the fixed order `[North,East,South,West,Local]`,
	/// dropping any direction that would leave the mesh.
	pub fn new_mesh(router_index:usize, coord:MeshCoord, num_rows:usize, num_cols:usize, num_nodes:usize) -> RoutingUnit
	{
		let mut inport_dirn = Vec::new();
		let mut outport_weight = Vec::new();
		for dir in [Direction::North,Direction::East,Direction::South,Direction::West,Direction::Local]
		{
			if dir==Direction::Local || RoutingUnit::neighbour_coord(coord,dir,num_rows,num_cols).is_some()
			{
				inport_dirn.push(dir);
				outport_weight.push(0);
			}
		}
		let outport_dirn = inport_dirn.clone();
		let outport_table = vec![NetDest::new(num_nodes); outport_dirn.len()];
		RoutingUnit{ router_index, coord, num_rows, num_cols, inport_dirn, outport_dirn, outport_weight, outport_table }
	}

	pub fn num_ports(&self) -> usize { self.outport_dirn.len() }

	pub fn port_of(&self, dir:Direction) -> Option<usize>
	{
		self.outport_dirn.iter().position(|d|*d==dir)
	}

	pub fn direction_of(&self, port:usize) -> Direction
	{
		self.outport_dirn[port]
	}

	pub fn inport_direction_of(&self, port:usize) -> Direction
	{
		self.inport_dirn[port]
	}

	/// The mesh coordinate reached by stepping one hop in `dir` from `from`,
	/// or `None` if that would leave the mesh (used both to build the port
	/// list and to validate spin-ring adjacency in `spin.rs`).
	pub fn neighbour_coord(from:MeshCoord, dir:Direction, num_rows:usize, num_cols:usize) -> Option<MeshCoord>
	{
		match dir
		{
			Direction::North => if from.y+1<num_rows { Some(MeshCoord{x:from.x,y:from.y+1}) } else { None },
			Direction::South => if from.y>0 { Some(MeshCoord{x:from.x,y:from.y-1}) } else { None },
			Direction::East => if from.x+1<num_cols { Some(MeshCoord{x:from.x+1,y:from.y}) } else { None },
			Direction::West => if from.x>0 { Some(MeshCoord{x:from.x-1,y:from.y}) } else { None },
			Direction::Local => Some(from),
		}
	}

	/// Registers that `outport` is a table-driven route towards `dest_router`,
	/// called by the topology builder while wiring up `make_internal_link`/
	/// `make_ext_out_link` (§4.8).
	pub fn add_table_entry(&mut self, outport:usize, dest_router:usize)
	{
		self.outport_table[outport].add(dest_router);
	}

	pub fn set_weight(&mut self, outport:usize, weight:u32)
	{
		self.outport_weight[outport] = weight;
	}

	/// The set of outports that make forward progress towards `flit`'s
	/// destination (§4.1): for XY routing this is never more than one
	/// outport plus, at the destination router, the Local port. Used by
	/// SPIN to classify a rotation as forward-progress vs. misroute.
	pub fn lookup(&self, flit:&Flit) -> Vec<usize>
	{
		if flit.route.dest_router==self.router_index
		{
			return self.port_of(Direction::Local).into_iter().collect();
		}
		self.port_of(self.xy_preferred_direction(flit.route.dest_router)).into_iter().collect()
	}

	fn dest_coord(&self, dest_router:usize) -> MeshCoord
	{
		MeshCoord{ x: dest_router % self.num_cols, y: dest_router / self.num_cols }
	}

	/// The XY-preferred direction towards `dest_router`, exposed so the
	/// topology builder can populate `outport_table` with the same routing
	/// decision `outport_compute` would make (§4.8 construction concern).
	pub fn xy_preferred_direction(&self, dest_router:usize) -> Direction
	{
		let dest = self.dest_coord(dest_router);
		if dest.x != self.coord.x
		{
			if dest.x > self.coord.x { Direction::East } else { Direction::West }
		}
		else if dest.y > self.coord.y { Direction::North }
		else { Direction::South }
	}

	/// Computes exactly one outport for `flit` arriving at `inport` (§4.1).
	/// Deterministic: XY order first, ties (there are none under pure XY,
	/// but SPIN re-routing after a misroute can create them) broken by
	/// table weight, then by direction ordering (`Direction::mesh_order`).
	pub fn outport_compute(&self, flit:&Flit, _inport:usize) -> usize
	{
		if flit.route.dest_router==self.router_index
		{
			return self.port_of(Direction::Local).expect("a router must have a Local port");
		}
		let preferred_dir = self.xy_preferred_direction(flit.route.dest_router);
		if let Some(port) = self.port_of(preferred_dir)
		{
			return port;
		}
		// Preferred direction's port does not exist on this router (should
		// not happen on a well-formed mesh for in-bounds destinations); fall
		// back to the routing table, breaking ties by weight then direction order.
		let mut candidates:Vec<usize> = (0..self.outport_table.len())
			.filter(|&p|self.outport_table[p].contains(flit.route.dest_router))
			.collect();
		candidates.sort_by_key(|&p|(self.outport_weight[p],Direction::mesh_order().iter().position(|d|*d==self.outport_dirn[p]).unwrap_or(usize::MAX)));
		*candidates.first().unwrap_or_else(||panic!("router {} has no route to destination router {}",self.router_index,flit.route.dest_router))
	}

	/// Manhattan distance, in hop count, from this router to `dest_router` (§4.7).
	pub fn hops_remaining(&self, dest_router:usize) -> u32
	{
		self.coord.manhattan_distance(self.dest_coord(dest_router))
	}
}
