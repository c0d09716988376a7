/*!

Switch traversal (§4.6): executes the `Grant`s the `SwitchAllocator`
produced this cycle, moving each granted flit from its `InputUnit` VC
onto the destination `OutputUnit`'s outbound link and generating the
upstream credit return. Grounded on `Basic`'s `process_ready_packets`
(the loop that actually moves a `Phit` once both sides of an allocation
have agreed), narrowed to the spec's one-grant-per-outport-per-cycle
shape.

*/

use crate::allocator::Grant;
use crate::credit::Credit;
use crate::event::Time;
use crate::flit::Stage;
use crate::input_unit::InputUnit;
use crate::output_unit::OutputUnit;
use crate::routing::RoutingUnit;

/// A credit that must be pushed onto the `CreditLink` connecting this
/// router's inport back to `upstream_router`'s outport `upstream_port`.
/// The link itself is not owned here (§3: links are owned by the
/// network), so the crossbar only reports what needs to be sent and
/// leaves delivery to the caller.
pub struct PendingCredit
{
	pub upstream_router: Option<usize>,
	pub upstream_port: usize,
	pub credit: Credit,
}

/// Moves granted flits from inports to outports and tallies how many
/// transfers have happened, for the memory/activity reporting named in
/// the ambient stack.
#[derive(Debug,Default)]
pub struct CrossbarSwitch
{
	pub total_transfers: u64,
}

impl CrossbarSwitch
{
	pub fn new() -> CrossbarSwitch
	{
		CrossbarSwitch{ total_transfers: 0 }
	}

	/// Executes every grant: pops the head-of-line flit, rewrites it for
	/// its next hop, pushes it onto the destination outbound link, and
	/// returns the credits that must travel back upstream. `halt`
	/// suppresses traversal entirely (§4.7), matching the allocator's own
	/// halt behaviour so no flit moves while SPIN holds the lock.
	pub fn traverse(&mut self, current_cycle:Time, halt:bool, grants:&[Grant], input_units:&mut [InputUnit], output_units:&mut [OutputUnit], routing:&RoutingUnit) -> Vec<PendingCredit>
	{
		let mut pending_credits = Vec::new();
		if halt { return pending_credits; }

		for grant in grants
		{
			let mut flit = match input_units[grant.inport].get_top_flit(grant.vc)
			{
				Some(f) => f,
				None => continue,
			};
			let is_tail = flit.is_tail();

			flit.outport = Some(grant.outport);
			flit.outport_dir = Some(routing.direction_of(grant.outport));
			flit.vc = grant.out_vc;
			flit.hops += 1;
			flit.advance_stage(Stage::St,current_cycle);

			output_units[grant.outport].insert(current_cycle,flit);
			self.total_transfers += 1;

			let credit = input_units[grant.inport].make_return_credit(grant.vc,is_tail);
			if is_tail
			{
				input_units[grant.inport].set_vc_idle(grant.vc,current_cycle);
			}
			pending_credits.push(PendingCredit{
				upstream_router: input_units[grant.inport].credit_return_link.upstream_router,
				upstream_port: input_units[grant.inport].credit_return_link.upstream_port,
				credit,
			});
		}
		pending_credits
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::direction::Direction;
	use crate::flit::{Flit,FlitType,NetDest,RouteInfo};
	use crate::link::{CreditLink,LinkKind,NetworkLink};
	use crate::routing::MeshCoord;

	fn make_flit(dest_router:usize) -> Flit
	{
		let route = RouteInfo{ dest_ni:dest_router, dest_router, src_router:0, vnet:0, net_dest: NetDest::singleton(4,dest_router) };
		Flit::new(0,0,0,0,FlitType::HeadTail,route,1,false,0)
	}

	#[test]
	fn traversal_moves_flit_and_returns_a_free_signal_credit()
	{
		let routing = RoutingUnit::new_mesh(0,MeshCoord{x:0,y:0},2,2,4);
		let east = routing.port_of(Direction::East).unwrap();
		let mut input_units = vec![InputUnit::new(0,0,Direction::West,1,4,NetworkLink::new(LinkKind::Internal,1),Some(9),2)];
		input_units[0].vc_mut(0).buffer.push_back(make_flit(3));
		input_units[0].vc_mut(0).outport = Some(east);
		input_units[0].vc_mut(0).bound_out_vc = Some(0);
		let mut output_units:Vec<OutputUnit> = (0..routing.num_ports()).map(|p|OutputUnit::new(0,p,routing.direction_of(p),1,4,NetworkLink::new(LinkKind::Internal,1),Some(3),0)).collect();
		let grants = vec![Grant{ inport: 0, vc: 0, outport: east, out_vc: 0 }];

		let mut xbar = CrossbarSwitch::new();
		let credits = xbar.traverse(5,false,&grants,&mut input_units,&mut output_units,&routing);

		assert_eq!(xbar.total_transfers,1);
		assert!(input_units[0].vc_is_empty(0));
		assert_eq!(credits.len(),1);
		assert!(credits[0].credit.is_free_signal);
		assert!(!output_units[east].outbound_link.is_empty());
	}
}
