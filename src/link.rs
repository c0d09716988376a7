/*!

Unidirectional FIFO links with a fixed latency, grounded on the
`StatusAtEmissor`/`SpaceAtReceptor`/`CreditCounterVector` trio in
`router/mod.rs`: there the emissor side tracks credits and the
receptor side tracks buffer space. Here the two concerns are split
along the two link kinds named in §3: `NetworkLink` carries flits
downstream, `CreditLink` carries `Credit`s back upstream. Both are
a bounded delay pipeline — a value written at cycle `t` is readable
at cycle `t + latency` — so they share one generic `DelayPipeline`.

*/

use std::collections::VecDeque;
use crate::flit::Flit;
use crate::credit::Credit;
use crate::event::Time;
use crate::quantify::Quantifiable;

/// A bounded delay pipeline: `push` at cycle `t` becomes visible to `pop`
/// only once the simulation reaches cycle `t + latency`.
#[derive(Debug)]
pub struct DelayPipeline<T>
{
	latency: Time,
	/// `(ready_at_cycle, value)`, oldest first.
	pending: VecDeque<(Time,T)>,
}

impl<T> DelayPipeline<T>
{
	pub fn new(latency:Time) -> DelayPipeline<T>
	{
		assert!(latency >= 1, "link latency must be at least 1 cycle");
		DelayPipeline{ latency, pending: VecDeque::new() }
	}

	pub fn push(&mut self, current_cycle:Time, value:T)
	{
		self.pending.push_back((current_cycle+self.latency,value));
	}

	/// Pop the value at the front if it is ready at `current_cycle`.
	pub fn pop_ready(&mut self, current_cycle:Time) -> Option<T>
	{
		if let Some((ready_at,_)) = self.pending.front()
		{
			if *ready_at <= current_cycle
			{
				return self.pending.pop_front().map(|(_,v)|v);
			}
		}
		None
	}

	pub fn is_empty(&self) -> bool
	{
		self.pending.is_empty()
	}

	pub fn len(&self) -> usize
	{
		self.pending.len()
	}

	pub fn latency(&self) -> Time { self.latency }
}

impl<T:Quantifiable> Quantifiable for DelayPipeline<T>
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<DelayPipeline<T>>() + self.pending.iter().map(|(_,v)|v.total_memory()).sum::<usize>()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize
	{
		std::mem::size_of::<DelayPipeline<T>>() + self.pending.capacity()*std::mem::size_of::<(Time,T)>()
	}
}

/// Distinguishes the three construction-time link kinds named in §4.8/§9:
/// external-in (NI -> router), external-out (router -> NI), and
/// internal (router -> router).
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum LinkKind
{
	ExtIn,
	ExtOut,
	Internal,
}

impl Quantifiable for LinkKind
{
	fn total_memory(&self) -> usize { std::mem::size_of::<LinkKind>() }
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { std::mem::size_of::<LinkKind>() }
}

/// A unidirectional flit-carrying link between two ports.
#[derive(Debug)]
pub struct NetworkLink
{
	pub kind: LinkKind,
	pipeline: DelayPipeline<Flit>,
}

impl NetworkLink
{
	pub fn new(kind:LinkKind, latency:Time) -> NetworkLink
	{
		NetworkLink{ kind, pipeline: DelayPipeline::new(latency) }
	}
	pub fn push(&mut self, current_cycle:Time, flit:Flit)
	{
		self.pipeline.push(current_cycle,flit);
	}
	pub fn pop_ready(&mut self, current_cycle:Time) -> Option<Flit>
	{
		self.pipeline.pop_ready(current_cycle)
	}
	/// Used by SPIN's `chck_link_state` (§4.9, invariant 4 of §8): every
	/// output-link buffer must be empty while the fabric is quiesced.
	pub fn is_empty(&self) -> bool
	{
		self.pipeline.is_empty()
	}
	pub fn latency(&self) -> Time { self.pipeline.latency() }
}

impl Quantifiable for NetworkLink
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<NetworkLink>() + self.pipeline.total_memory()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { self.total_memory() }
}

/// The antiparallel credit-return link paired with every `NetworkLink`.
#[derive(Debug)]
pub struct CreditLink
{
	pipeline: DelayPipeline<Credit>,
}

impl CreditLink
{
	pub fn new(latency:Time) -> CreditLink
	{
		CreditLink{ pipeline: DelayPipeline::new(latency) }
	}
	pub fn push(&mut self, current_cycle:Time, credit:Credit)
	{
		self.pipeline.push(current_cycle,credit);
	}
	pub fn pop_ready(&mut self, current_cycle:Time) -> Option<Credit>
	{
		self.pipeline.pop_ready(current_cycle)
	}
	pub fn is_empty(&self) -> bool { self.pipeline.is_empty() }
}

impl Quantifiable for CreditLink
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<CreditLink>() + self.pipeline.total_memory()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { self.total_memory() }
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn value_becomes_ready_after_latency()
	{
		let mut p : DelayPipeline<u32> = DelayPipeline::new(3);
		p.push(10,42);
		assert_eq!(p.pop_ready(10),None);
		assert_eq!(p.pop_ready(12),None);
		assert_eq!(p.pop_ready(13),Some(42));
		assert!(p.is_empty());
	}

	#[test]
	fn fifo_ordering_preserved()
	{
		let mut p : DelayPipeline<u32> = DelayPipeline::new(2);
		p.push(0,1);
		p.push(1,2);
		assert_eq!(p.pop_ready(2),Some(1));
		assert_eq!(p.pop_ready(2),None);
		assert_eq!(p.pop_ready(3),Some(2));
	}
}
