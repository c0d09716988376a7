/*!

Per-inport virtual-channel buffering (§4.2), grounded on
`CreditCounterVector`/`SpaceAtReceptor` in `router/mod.rs` and on
`Basic`'s `reception_port_space` field in `router/basic.rs`, narrowed
from the teacher's pluggable `TransmissionMechanism` trait object down
to one concrete VC-buffer implementation matching the spec's fixed
Garnet semantics.

*/

use std::collections::VecDeque;
use quantifiable_derive::Quantifiable;
use crate::credit::Credit;
use crate::direction::Direction;
use crate::error::Error;
use crate::error;
use crate::event::Time;
use crate::flit::Flit;
use crate::link::NetworkLink;
use crate::quantify::Quantifiable;
use crate::vc_state::VcState;

/// One virtual channel's buffer and bookkeeping.
#[derive(Debug,Quantifiable)]
pub struct VirtualChannel
{
	pub state: VcState,
	/// Set once a HEAD flit has been granted an outport (VC allocation, §4.5).
	pub outport: Option<usize>,
	/// Which VC on that outport the HEAD was bound to; BODY/TAIL flits of
	/// the same packet reuse this exact (outport,vc) pairing (§3 VC exclusivity).
	pub bound_out_vc: Option<usize>,
	pub buffer: VecDeque<Flit>,
	pub last_activity_cycle: Time,
	capacity: usize,
}

impl VirtualChannel
{
	fn new(capacity:usize) -> VirtualChannel
	{
		VirtualChannel{ state: VcState::Idle, outport: None, bound_out_vc: None, buffer: VecDeque::new(), last_activity_cycle: 0, capacity }
	}
	pub fn is_empty(&self) -> bool { self.buffer.is_empty() }
	pub fn is_full(&self) -> bool { self.buffer.len() >= self.capacity }
	pub fn capacity(&self) -> usize { self.capacity }
	pub fn occupancy(&self) -> usize { self.buffer.len() }
}

/// All the virtual channels behind one inport, plus the inbound link
/// they are fed from and the credit-return link back upstream.
pub struct InputUnit
{
	pub router_index: usize,
	pub port: usize,
	pub direction: Direction,
	vcs: Vec<VirtualChannel>,
	pub inbound_link: NetworkLink,
	pub credit_return_link: CreditLinkHandle,
}

/// A thin handle so `InputUnit::wakeup` can push a credit without owning
/// the upstream `CreditLink` directly (the link is owned by the network,
/// since it is shared with the upstream `OutputUnit`, per the ownership
/// rule in §3: "Each link is exclusively owned by its source endpoint for
/// pushing and its sink endpoint for popping").
pub struct CreditLinkHandle
{
	pub upstream_router: Option<usize>,
	pub upstream_port: usize,
}

impl InputUnit
{
	pub fn new(router_index:usize, port:usize, direction:Direction, num_vcs:usize, buffer_capacity:usize, inbound_link:NetworkLink, upstream_router:Option<usize>, upstream_port:usize) -> InputUnit
	{
		InputUnit{
			router_index, port, direction,
			vcs: (0..num_vcs).map(|_|VirtualChannel::new(buffer_capacity)).collect(),
			inbound_link,
			credit_return_link: CreditLinkHandle{ upstream_router, upstream_port },
		}
	}

	pub fn num_vcs(&self) -> usize { self.vcs.len() }
	pub fn vc(&self, vc:usize) -> &VirtualChannel { &self.vcs[vc] }
	pub fn vc_mut(&mut self, vc:usize) -> &mut VirtualChannel { &mut self.vcs[vc] }

	pub fn peek_top_flit(&self, vc:usize) -> Option<&Flit>
	{
		self.vcs[vc].buffer.front()
	}

	/// Pops the head-of-line flit of `vc`. Does not itself issue the
	/// credit; callers (the switch allocator, or SPIN's Stage A) are
	/// responsible for returning one credit upstream per §4.2.
	pub fn get_top_flit(&mut self, vc:usize) -> Option<Flit>
	{
		self.vcs[vc].buffer.pop_front()
	}

	pub fn vc_is_empty(&self, vc:usize) -> bool
	{
		self.vcs[vc].is_empty()
	}

	pub fn set_vc_active(&mut self, vc:usize, cycle:Time)
	{
		self.vcs[vc].state = VcState::Active;
		self.vcs[vc].last_activity_cycle = cycle;
	}

	pub fn set_vc_idle(&mut self, vc:usize, cycle:Time)
	{
		self.vcs[vc].state = VcState::Idle;
		self.vcs[vc].outport = None;
		self.vcs[vc].bound_out_vc = None;
		self.vcs[vc].last_activity_cycle = cycle;
	}

	/// Drains at most one flit (if any) from the inbound link into the VC
	/// its `vc` field names (§4.2, step 1 of §2's per-cycle control flow).
	pub fn wakeup(&mut self, current_cycle:Time) -> Result<(),Error>
	{
		if let Some(flit) = self.inbound_link.pop_ready(current_cycle)
		{
			let vc = flit.vc;
			if self.vcs[vc].is_full()
			{
				return Err(error!(vc_overflow,self.router_index,self.port,vc));
			}
			if flit.is_head() && self.vcs[vc].state==VcState::Idle
			{
				self.vcs[vc].state = VcState::VcAb;
			}
			self.vcs[vc].last_activity_cycle = current_cycle;
			self.vcs[vc].buffer.push_back(flit);
		}
		Ok(())
	}

	/// Returns a credit for `vc` towards the upstream `OutputUnit`, called
	/// whenever a flit is dequeued from this VC (switch-allocation grant or
	/// SPIN Stage A removal).
	pub fn make_return_credit(&self, vc:usize, is_free_signal:bool) -> Credit
	{
		Credit::new(vc,is_free_signal)
	}
}

impl Quantifiable for InputUnit
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<InputUnit>() + self.vcs.total_memory() + self.inbound_link.total_memory()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { self.total_memory() }
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::flit::{FlitType,RouteInfo,NetDest};
	use crate::link::LinkKind;

	fn make_flit(vc:usize) -> Flit
	{
		let route = RouteInfo{ dest_ni:3, dest_router:3, src_router:0, vnet:0, net_dest: NetDest::singleton(4,3) };
		Flit::new(0,0,0,vc,FlitType::Head,route,4,false,0)
	}

	#[test]
	fn drains_arriving_flit_into_named_vc()
	{
		let mut link = NetworkLink::new(LinkKind::Internal,1);
		link.push(0,make_flit(1));
		let mut iu = InputUnit::new(0,0,Direction::West,2,4,link,Some(9),2);
		iu.wakeup(1).unwrap();
		assert!(!iu.vc_is_empty(1));
		assert!(iu.vc_is_empty(0));
		assert_eq!(iu.vc(1).state,VcState::VcAb);
	}

	#[test]
	fn overflow_is_an_invariant_violation()
	{
		let mut iu = InputUnit::new(0,0,Direction::West,1,1,NetworkLink::new(LinkKind::Internal,1),Some(9),2);
		// fill the single slot directly, then force another arrival.
		iu.vc_mut(0).buffer.push_back(make_flit(0));
		let mut link = NetworkLink::new(LinkKind::Internal,1);
		link.push(0,make_flit(0));
		iu.inbound_link = link;
		assert!(iu.wakeup(1).is_err());
	}
}
