/*!

SPIN deadlock recovery (§4.9): an ordered ring of `(router_id,
direction)` nodes. Every `spin_threshold_cycles`, the fabric quiesces,
every flit resident on the ring's named inports rotates one hop around
the ring (Stage A removes, Stage B reinserts with the route
recomputed and the pipeline stage reset to `Sa`), and normal operation
resumes. Grounded on the periodic-rotation description of gem5's SPIN
implementation in `original_source/`, expressed here with the crate's
own `InputUnit`/`OutputUnit`/`RoutingUnit` primitives rather than
ported line for line.

*/

use crate::direction::Direction;
use crate::error::Error;
use crate::event::Time;
use crate::flit::{Flit,Stage};
use crate::router::Router;
use crate::vc_state::VcState;

/// The parsed, validated ring: `nodes[i] = (router_id, direction)`, with
/// the implicit first node already prepended and no trailing duplicate
/// of node 0 (Open Question resolution, §9: closure is implemented by
/// indexing `nodes[(i+1) % nodes.len()]` rather than storing the
/// duplicate the prose description uses for exposition).
#[derive(Debug,Clone)]
pub struct SpinRing
{
	nodes: Vec<(usize,Direction)>,
	pub total_rotations: u64,
	pub total_bubbles: u64,
	pub total_forward_progress: u64,
	pub total_misroutes: u64,
	pub total_misroute_hops: u64,
}

/// Running accounting for one `rotate` call, surfaced to the caller for
/// logging/statistics.
#[derive(Debug,Clone,Copy,Default)]
pub struct RotationReport
{
	pub moved: usize,
	pub bubbles: usize,
	pub forward_progress: usize,
	pub misroutes: usize,
}

impl SpinRing
{
	/// Parses the whitespace-separated `(router_id,direction_token)` pairs
	/// already tokenized by `params::tokenize_ring`, prepends the implicit
	/// first node, and validates ring closure (§6).
	pub fn parse(file_nodes:Vec<(usize,Direction)>, num_rows:usize, num_cols:usize) -> Result<SpinRing,Error>
	{
		let last_router = file_nodes.last().ok_or_else(||error!(ill_formed_spin_ring,"ring description is empty".to_string()))?.0;
		let implicit_first = if last_router==1
		{
			(0,Direction::East)
		}
		else if last_router==num_rows
		{
			(0,Direction::North)
		}
		else
		{
			return Err(error!(ring_does_not_close,last_router));
		};
		let mut nodes = vec![implicit_first];
		nodes.extend(file_nodes);

		let ring = SpinRing{ nodes, total_rotations:0, total_bubbles:0, total_forward_progress:0, total_misroutes:0, total_misroute_hops:0 };
		ring.validate(num_rows,num_cols)?;
		Ok(ring)
	}

	/// Checks that consecutive ring nodes are actually adjacent in the
	/// direction they name: node `i`'s direction must lead back to node
	/// `i-1`'s router (§6: "the direction that connects back to the
	/// previous node").
	fn validate(&self, num_rows:usize, num_cols:usize) -> Result<(),Error>
	{
		let n = self.nodes.len();
		for i in 0..n
		{
			let (router_id,dir) = self.nodes[i];
			if dir==Direction::Local { continue; }
			let (prev_router,_) = self.nodes[(i+n-1)%n];
			let coord = crate::routing::MeshCoord{ x: router_id%num_cols, y: router_id/num_cols };
			let prev_coord = crate::routing::MeshCoord{ x: prev_router%num_cols, y: prev_router/num_cols };
			match crate::routing::RoutingUnit::neighbour_coord(coord,dir,num_rows,num_cols)
			{
				Some(reached) if reached.x==prev_coord.x && reached.y==prev_coord.y => {},
				_ => return Err(error!(ill_formed_spin_ring,format!("ring node {} ({},{:?}) does not connect back to the previous node (router {})",i,router_id,dir,prev_router))),
			}
		}
		Ok(())
	}

	pub fn len(&self) -> usize { self.nodes.len() }
	pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

	/// Rotates every flit resident on the ring's named inports one hop
	/// forward, for virtual channel `vc`. `drain_all_vc` callers instead
	/// call this once per VC (§9 Open Question: default behaviour only
	/// rotates VC 0, matching the gem5 reference's single-VC sweep).
	pub fn rotate(&mut self, routers:&mut [Router], vc:usize, current_cycle:Time) -> Result<RotationReport,Error>
	{
		let n = self.nodes.len();
		struct Removed { flit:Flit, forward_progress:bool, departure_router:usize, departure_port:usize }
		let mut removed:Vec<Option<Removed>> = Vec::with_capacity(n);

		// Stage A: remove.
		for i in 0..n
		{
			let (router_id,dir) = self.nodes[i];
			if dir==Direction::Local { removed.push(None); continue; }
			let port = match routers[router_id].routing().port_of(dir)
			{
				Some(p) => p,
				None => return Err(error!(bad_topology_reference,format!("ring node {} names direction {:?} which router {} does not have",i,dir,router_id))),
			};
			if vc>=routers[router_id].input_units()[port].num_vcs() || routers[router_id].input_units()[port].vc_is_empty(vc)
			{
				removed.push(None);
				continue;
			}

			let (_,next_dir) = self.nodes[(i+1)%n];
			let departure_port = routers[router_id].routing().port_of(next_dir.opposite())
				.ok_or_else(||error!(bad_topology_reference,format!("router {} has no outport towards ring node {}",router_id,(i+1)%n)))?;
			let preferred = routers[router_id].input_units()[port].peek_top_flit(vc).map(|f|routers[router_id].routing().lookup(f)).unwrap_or_default();
			let forward_progress = preferred.contains(&departure_port);

			let mut flit = routers[router_id].input_units_mut()[port].get_top_flit(vc).unwrap();
			if flit.hops_needed_before_spin.is_some()
			{
				return Err(error!(spin_sentinel_not_reset,"hops_needed_before_spin"));
			}
			flit.hops_needed_before_spin = Some(routers[router_id].routing().hops_remaining(flit.route.dest_router));
			routers[router_id].input_units_mut()[port].set_vc_idle(vc,current_cycle);

			// credit the node upstream of this removal (§4.9: "return one
			// credit upstream and mark the upstream outVC IDLE").
			let (prev_router,_) = self.nodes[(i+n-1)%n];
			let prev_departure_port = routers[prev_router].routing().port_of(dir.opposite())
				.ok_or_else(||error!(bad_topology_reference,format!("router {} has no outport towards ring node {}",prev_router,i)))?;
			routers[prev_router].output_units_mut()[prev_departure_port].increment_credit(vc);
			routers[prev_router].output_units_mut()[prev_departure_port].set_vc_state(VcState::Idle,vc,current_cycle);

			removed.push(Some(Removed{ flit, forward_progress, departure_router:router_id, departure_port }));
		}

		let mut report = RotationReport::default();
		report.bubbles = removed.iter().filter(|r|r.is_none()).count();
		let removed_count = n - report.bubbles;

		// Stage B: insert, each removed flit advancing to the next ring node.
		for i in 0..n
		{
			let item = match removed[i].take() { Some(r) => r, None => continue };
			let Removed{ mut flit, forward_progress, departure_router, departure_port } = item;
			if forward_progress { report.forward_progress += 1; } else { report.misroutes += 1; }

			let (next_router,next_dir) = self.nodes[(i+1)%n];
			let insertion_port = routers[next_router].routing().port_of(next_dir)
				.ok_or_else(||error!(bad_topology_reference,format!("router {} has no inport named {:?}",next_router,next_dir)))?;

			routers[departure_router].output_units_mut()[departure_port].decrement_credit(flit.vc)?;
			routers[departure_router].output_units_mut()[departure_port].set_vc_state(VcState::Active,flit.vc,current_cycle);

			let new_outport = routers[next_router].routing().outport_compute(&flit,insertion_port);
			flit.outport = Some(new_outport);
			flit.outport_dir = Some(routers[next_router].routing().direction_of(new_outport));
			flit.hops += 1;
			flit.stage = Stage::Sa;
			flit.stage_cycle = current_cycle;

			let hops_after = routers[next_router].routing().hops_remaining(flit.route.dest_router);
			flit.hops_needed_after_spin = Some(hops_after);
			if let Some(before) = flit.hops_needed_before_spin
			{
				if hops_after>before { self.total_misroute_hops += (hops_after-before) as u64; }
			}
			flit.hops_needed_before_spin = None;
			flit.hops_needed_after_spin = None;

			let insertion_vc = flit.vc;
			routers[next_router].input_units_mut()[insertion_port].vc_mut(insertion_vc).buffer.push_back(flit);
			routers[next_router].input_units_mut()[insertion_port].set_vc_active(insertion_vc,current_cycle);
			report.moved += 1;
		}

		// §4.9/§7/§8 invariant: Stage A and Stage B move the same count.
		// Enforced as a checked assertion rather than left implicit in the
		// loop shape, so a future change that makes Stage B skip an item
		// for its own reasons is caught instead of silently under-counting.
		if report.moved != removed_count
		{
			return Err(error!(spin_count_mismatch,removed_count,report.moved));
		}

		self.total_rotations += 1;
		self.total_bubbles += report.bubbles as u64;
		self.total_forward_progress += report.forward_progress as u64;
		self.total_misroutes += report.misroutes as u64;
		Ok(report)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::flit::{FlitType,NetDest,RouteInfo};
	use crate::link::{CreditLink,LinkKind,NetworkLink};
	use crate::output_unit::OutputUnit;
	use crate::input_unit::InputUnit;
	use crate::routing::{MeshCoord,RoutingUnit};

	fn make_router(router_index:usize, coord:MeshCoord) -> Router
	{
		let routing = RoutingUnit::new_mesh(router_index,coord,2,2,4);
		let n = routing.num_ports();
		let input_units = (0..n).map(|p|InputUnit::new(router_index,p,routing.inport_direction_of(p),1,4,NetworkLink::new(LinkKind::Internal,1),None,0)).collect();
		let output_units = (0..n).map(|p|OutputUnit::new(router_index,p,routing.direction_of(p),1,4,NetworkLink::new(LinkKind::Internal,1),None,0)).collect();
		let credit_return_links = (0..n).map(|_|CreditLink::new(1)).collect();
		Router::new(router_index,routing,input_units,output_units,credit_return_links)
	}

	fn sample_ring() -> SpinRing
	{
		let file_nodes = vec![(1,Direction::West),(3,Direction::South),(2,Direction::East)];
		SpinRing::parse(file_nodes,2,2).unwrap()
	}

	#[test]
	fn parses_and_closes_a_four_router_ring()
	{
		let ring = sample_ring();
		assert_eq!(ring.len(),4);
	}

	#[test]
	fn rejects_a_ring_whose_last_node_does_not_close()
	{
		let file_nodes = vec![(1,Direction::West),(3,Direction::South)];
		// last router is 3, neither 1 nor num_rows(2): must fail.
		assert!(SpinRing::parse(file_nodes,2,2).is_err());
	}

	#[test]
	fn rotate_moves_a_resident_flit_to_the_next_ring_node()
	{
		let mut ring = sample_ring();
		let mut routers:Vec<Router> = (0..4).map(|id|make_router(id,MeshCoord{x:id%2,y:id/2})).collect();

		let north0 = routers[0].routing().port_of(Direction::North).unwrap();
		let route = RouteInfo{ dest_ni:3, dest_router:3, src_router:0, vnet:0, net_dest: NetDest::singleton(4,3) };
		let flit = Flit::new(0,0,0,0,FlitType::HeadTail,route,1,false,0);
		routers[0].input_units_mut()[north0].vc_mut(0).buffer.push_back(flit);
		routers[0].input_units_mut()[north0].set_vc_active(0,0);

		let report = ring.rotate(&mut routers,0,10).unwrap();
		assert_eq!(report.moved,1);
		assert_eq!(report.bubbles,3);

		let west1 = routers[1].routing().port_of(Direction::West).unwrap();
		assert!(!routers[1].input_units()[west1].vc_is_empty(0));
		assert!(routers[0].input_units()[north0].vc_is_empty(0));
	}
}
