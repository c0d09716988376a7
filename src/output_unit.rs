/*!

Per-outport VC state and credit counters (§4.3), grounded on
`CreditCounterVector` in `router/mod.rs` (`neighbour_credits`,
`notify_outcoming_phit`, `acknowledge`) generalised from "one credit
counter per physical port" to "one credit counter per (outport, vc)"
as named in §3.

*/

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

#[derive(Debug,Quantifiable)]
struct OutputVc
{
	state: VcState,
	credits: usize,
	capacity: usize,
	last_activity_cycle: Time,
}

/// All the per-VC allocation state and credit counters behind one
/// outport, plus the outbound `NetworkLink` flits are pushed onto.
pub struct OutputUnit
{
	pub router_index: usize,
	pub port: usize,
	pub direction: Direction,
	vcs: Vec<OutputVc>,
	pub outbound_link: NetworkLink,
	pub downstream_router: Option<usize>,
	pub downstream_port: usize,
}

impl OutputUnit
{
	pub fn new(router_index:usize, port:usize, direction:Direction, num_vcs:usize, buffer_capacity:usize, outbound_link:NetworkLink, downstream_router:Option<usize>, downstream_port:usize) -> OutputUnit
	{
		OutputUnit{
			router_index, port, direction,
			vcs: (0..num_vcs).map(|_|OutputVc{ state: VcState::Idle, credits: buffer_capacity, capacity: buffer_capacity, last_activity_cycle: 0 }).collect(),
			outbound_link, downstream_router, downstream_port,
		}
	}

	pub fn num_vcs(&self) -> usize { self.vcs.len() }

	pub fn has_credit(&self, vc:usize) -> bool
	{
		self.vcs[vc].credits > 0
	}

	pub fn state(&self, vc:usize) -> VcState { self.vcs[vc].state }

	pub fn set_vc_state(&mut self, state:VcState, vc:usize, cycle:Time)
	{
		self.vcs[vc].state = state;
		self.vcs[vc].last_activity_cycle = cycle;
	}

	/// Decrements the credit counter for `vc`, called whenever a flit is
	/// actually sent on that VC (§4.3). Returns `CreditUnderflow` — an
	/// `InvariantViolation` per §7 — if the counter was already zero, since
	/// that would mean we sent without a credit in hand.
	pub fn decrement_credit(&mut self, vc:usize) -> Result<(),Error>
	{
		if self.vcs[vc].credits==0
		{
			return Err(error!(credit_underflow,self.router_index,self.port,vc));
		}
		self.vcs[vc].credits -= 1;
		Ok(())
	}

	/// Increments the credit counter for `vc`, called when a `Credit`
	/// arrives back from the downstream `InputUnit` (§4.3).
	pub fn increment_credit(&mut self, vc:usize)
	{
		self.vcs[vc].credits = (self.vcs[vc].credits+1).min(self.vcs[vc].capacity);
	}

	/// Pushes `flit` onto the outbound link at the configured link latency
	/// (§4.3). Caller (the crossbar) is responsible for having already
	/// decremented the credit and checked `halt`.
	pub fn insert(&mut self, current_cycle:Time, flit:Flit)
	{
		self.outbound_link.push(current_cycle,flit);
	}

	/// Drains at most one credit (if any) from the credit-return link and
	/// applies it (§2 step 2 of the per-cycle control flow).
	pub fn wakeup(&mut self, current_cycle:Time, credit_link:&mut crate::link::CreditLink)
	{
		if let Some(credit) = credit_link.pop_ready(current_cycle)
		{
			self.increment_credit(credit.vc);
			if credit.is_free_signal
			{
				self.set_vc_state(VcState::Idle,credit.vc,current_cycle);
			}
		}
	}
}

impl Quantifiable for OutputUnit
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<OutputUnit>() + self.vcs.total_memory() + self.outbound_link.total_memory()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { self.total_memory() }
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::link::{CreditLink,LinkKind};

	#[test]
	fn credit_conservation_round_trip()
	{
		let mut ou = OutputUnit::new(0,0,Direction::East,2,4,NetworkLink::new(LinkKind::Internal,1),Some(1),2);
		assert!(ou.has_credit(0));
		ou.decrement_credit(0).unwrap();
		ou.decrement_credit(0).unwrap();
		ou.decrement_credit(0).unwrap();
		ou.decrement_credit(0).unwrap();
		assert!(!ou.has_credit(0));
		assert!(ou.decrement_credit(0).is_err());
		let mut link = CreditLink::new(1);
		link.push(0,Credit::new(0,false));
		ou.wakeup(1,&mut link);
		assert!(ou.has_credit(0));
	}

	#[test]
	fn credit_free_signal_idles_the_vc()
	{
		let mut ou = OutputUnit::new(0,0,Direction::East,1,2,NetworkLink::new(LinkKind::Internal,1),Some(1),2);
		ou.set_vc_state(VcState::Active,0,0);
		let mut link = CreditLink::new(1);
		link.push(0,Credit::new(0,true));
		ou.wakeup(1,&mut link);
		assert_eq!(ou.state(0),VcState::Idle);
	}
}
