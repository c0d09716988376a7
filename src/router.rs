/*!

A concrete Garnet router (§3/§4.7): one `RoutingUnit`, one
`SwitchAllocator`, one `CrossbarSwitch`, and the input/output units
behind every port. Grounded on `Basic` in `router/basic.rs` for the
per-cycle structure (drain inputs, drain credits, allocate, traverse)
and the `halt` gate, but not on its event-scheduling: `Basic` is
individually `Eventful` and self-schedules via `Weak<RefCell<Basic>>`
because phits can arrive at arbitrary offsets; this simulator is fully
synchronous (every router steps every cycle), so `GarnetNetwork` alone
implements `Eventful` and drives every router's plain step methods in
router-id order (§5), instead of each router scheduling itself.

*/

use crate::allocator::SwitchAllocator;
use crate::crossbar::{CrossbarSwitch,PendingCredit};
use crate::credit::Credit;
use crate::error::Error;
use crate::event::Time;
use crate::flit::Flit;
use crate::input_unit::InputUnit;
use crate::link::CreditLink;
use crate::output_unit::OutputUnit;
use crate::quantify::Quantifiable;
use crate::routing::RoutingUnit;

pub struct Router
{
	pub router_index: usize,
	input_units: Vec<InputUnit>,
	output_units: Vec<OutputUnit>,
	/// The credit-return path into each `OutputUnit`: popped by
	/// `OutputUnit::wakeup`, pushed by whichever router's `InputUnit`
	/// consumed a flit on the other end (relayed through `GarnetNetwork`,
	/// since that `InputUnit` usually lives on a different `Router`).
	credit_return_links: Vec<CreditLink>,
	routing: RoutingUnit,
	allocator: SwitchAllocator,
	crossbar: CrossbarSwitch,
	/// Set by `GarnetNetwork` while the SPIN lock is held; suppresses
	/// switch allocation and traversal network-wide (§4.7, §4.9).
	pub halt: bool,
}

impl Router
{
	pub fn new(router_index:usize, routing:RoutingUnit, input_units:Vec<InputUnit>, output_units:Vec<OutputUnit>, credit_return_links:Vec<CreditLink>) -> Router
	{
		let num_outports = output_units.len();
		let num_inports = input_units.len();
		Router{
			router_index, input_units, output_units, credit_return_links, routing,
			allocator: SwitchAllocator::new(num_outports,num_inports),
			crossbar: CrossbarSwitch::new(),
			halt: false,
		}
	}

	pub fn num_inports(&self) -> usize { self.input_units.len() }
	pub fn num_outports(&self) -> usize { self.output_units.len() }
	pub fn routing(&self) -> &RoutingUnit { &self.routing }
	pub fn routing_mut(&mut self) -> &mut RoutingUnit { &mut self.routing }
	pub fn input_units(&self) -> &[InputUnit] { &self.input_units }
	pub fn input_units_mut(&mut self) -> &mut [InputUnit] { &mut self.input_units }
	pub fn output_units(&self) -> &[OutputUnit] { &self.output_units }
	pub fn output_units_mut(&mut self) -> &mut [OutputUnit] { &mut self.output_units }

	/// Step 1 of §2's per-cycle control flow: drain arriving flits into
	/// their named VC, and arriving credits into their `OutputUnit`.
	pub fn drain(&mut self, current_cycle:Time) -> Result<(),Error>
	{
		for iu in self.input_units.iter_mut()
		{
			iu.wakeup(current_cycle)?;
		}
		for (port,ou) in self.output_units.iter_mut().enumerate()
		{
			ou.wakeup(current_cycle,&mut self.credit_return_links[port]);
		}
		Ok(())
	}

	/// Steps 2-3: switch allocation then crossbar traversal. Returns the
	/// credits that must be delivered to upstream routers (or to an NI)
	/// by the caller, since this router does not own those links (§3).
	/// A no-op while `self.halt` is set.
	pub fn allocate_and_traverse(&mut self, current_cycle:Time) -> Result<Vec<PendingCredit>,Error>
	{
		let grants = self.allocator.allocate(current_cycle,self.halt,&mut self.input_units,&mut self.output_units,&self.routing)?;
		Ok(self.crossbar.traverse(current_cycle,self.halt,&grants,&mut self.input_units,&mut self.output_units,&self.routing))
	}

	/// Delivers a credit arriving from downstream onto this router's
	/// `port`'s credit-return path, for `GarnetNetwork` to call once it has
	/// resolved a `PendingCredit`'s destination.
	pub fn push_credit(&mut self, port:usize, current_cycle:Time, credit:Credit)
	{
		self.credit_return_links[port].push(current_cycle,credit);
	}

	/// Delivers a flit arriving over the wire onto this router's `port`'s
	/// inbound link, for `GarnetNetwork`'s internal-link relay step.
	pub fn push_inbound_flit(&mut self, port:usize, current_cycle:Time, flit:Flit)
	{
		self.input_units[port].inbound_link.push(current_cycle,flit);
	}

	/// Pops a flit that has finished link traversal out of `port`'s
	/// outbound link, for `GarnetNetwork`'s relay step to hand to whatever
	/// is on the other end (a neighbour router's inbound link, or an NI).
	pub fn pop_outbound_flit(&mut self, port:usize, current_cycle:Time) -> Option<Flit>
	{
		self.output_units[port].outbound_link.pop_ready(current_cycle)
	}

	/// How many marked flits (§4.10) are currently resident in this
	/// router's VC buffers. Used by `GarnetNetwork`'s termination check.
	pub fn marked_flits_resident(&self) -> usize
	{
		self.input_units.iter()
			.flat_map(|iu|(0..iu.num_vcs()).map(move |vc|iu.vc(vc)))
			.flat_map(|vc|vc.buffer.iter())
			.filter(|flit|flit.is_marked)
			.count()
	}
}

impl Quantifiable for Router
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<Router>() + self.input_units.total_memory() + self.output_units.total_memory() + self.credit_return_links.total_memory()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { self.total_memory() }
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::direction::Direction;
	use crate::flit::{FlitType,NetDest,RouteInfo};
	use crate::link::{LinkKind,NetworkLink};
	use crate::routing::MeshCoord;

	fn make_router(router_index:usize, coord:MeshCoord) -> Router
	{
		let routing = RoutingUnit::new_mesh(router_index,coord,2,2,4);
		let n = routing.num_ports();
		let input_units = (0..n).map(|p|InputUnit::new(router_index,p,routing.inport_direction_of(p),2,4,NetworkLink::new(LinkKind::Internal,1),None,0)).collect();
		let output_units = (0..n).map(|p|OutputUnit::new(router_index,p,routing.direction_of(p),2,4,NetworkLink::new(LinkKind::Internal,1),None,0)).collect();
		let credit_return_links = (0..n).map(|_|CreditLink::new(1)).collect();
		Router::new(router_index,routing,input_units,output_units,credit_return_links)
	}

	#[test]
	fn drain_then_allocate_moves_a_single_flit_to_local_destination()
	{
		let mut router = make_router(0,MeshCoord{x:0,y:0});
		let local = router.routing().port_of(Direction::Local).unwrap();
		let route = RouteInfo{ dest_ni:0, dest_router:0, src_router:0, vnet:0, net_dest: NetDest::singleton(4,0) };
		let flit = Flit::new(0,0,0,0,FlitType::HeadTail,route,1,false,0);
		router.push_inbound_flit(local,0,flit);
		router.drain(1).unwrap();
		assert!(!router.input_units()[local].vc_is_empty(0));
		let credits = router.allocate_and_traverse(2).unwrap();
		assert!(router.input_units()[local].vc_is_empty(0));
		assert_eq!(credits.len(),1);
	}

	#[test]
	fn halted_router_grants_nothing()
	{
		let mut router = make_router(0,MeshCoord{x:0,y:0});
		router.halt = true;
		let local = router.routing().port_of(Direction::Local).unwrap();
		let route = RouteInfo{ dest_ni:0, dest_router:0, src_router:0, vnet:0, net_dest: NetDest::singleton(4,0) };
		let flit = Flit::new(0,0,0,0,FlitType::HeadTail,route,1,false,0);
		router.push_inbound_flit(local,0,flit);
		router.drain(1).unwrap();
		let credits = router.allocate_and_traverse(2).unwrap();
		assert!(credits.is_empty());
		assert!(!router.input_units()[local].vc_is_empty(0));
	}
}
