/*!

Per-cycle switch allocation (§4.5): a two-stage arbitration from
inport VCs to outports. Grounded directly on `allocator/islip.rs`'s
`RoundVec` (a pointer-based round-robin priority list, only advanced on
a first-iteration grant) and on `ISLIPAllocator`'s request/grant/accept
shape, narrowed from the teacher's iterative all-to-all iSLIP matching
down to the spec's single-pass per-inport-nominates/per-outport-picks
arbitration, since Garnet routers allocate switch and VC together per
port rather than running a separate N-iteration matching.

*/

use crate::direction::Direction;
use crate::error::Error;
use crate::input_unit::InputUnit;
use crate::output_unit::OutputUnit;
use crate::routing::RoutingUnit;
use crate::vc_state::VcState;

/// A round-robin priority list over a fixed set of clients, in the style
/// of `allocator/islip.rs::RoundVec`: `pointer` names the client with
/// highest priority this cycle; it only advances when that slot actually
/// wins, which is what keeps an always-requesting client from starving
/// everyone downstream of it (the fairness requirement of §4.5).
#[derive(Debug,Clone)]
struct RoundRobinArbiter
{
	pointer: usize,
	n: usize,
}

impl RoundRobinArbiter
{
	fn new(n:usize) -> RoundRobinArbiter
	{
		RoundRobinArbiter{ pointer: 0, n }
	}

	/// Picks the highest-priority client among `candidates` (client
	/// indices, need not be sorted), breaking ties by distance forward
	/// from `pointer`, and advances `pointer` to just past the winner.
	fn pick(&mut self, candidates:&[usize]) -> Option<usize>
	{
		if candidates.is_empty() { return None; }
		let winner = *candidates.iter().min_by_key(|&&c|
		{
			if c>=self.pointer { c-self.pointer } else { c+self.n-self.pointer }
		}).unwrap();
		self.pointer = (winner+1) % self.n;
		Some(winner)
	}
}

/// One grant produced this cycle: the crossbar should move the
/// head-of-line flit of `(inport,vc)` to `outport` at virtual channel
/// `out_vc`. The allocator has already performed VC allocation (for
/// HEAD flits) and decremented the output VC's credit; the crossbar
/// only has to move data.
#[derive(Debug,Clone,Copy)]
pub struct Grant
{
	pub inport: usize,
	pub vc: usize,
	pub outport: usize,
	pub out_vc: usize,
}

/// Per-cycle switch allocation across every (inport,vc) x outport pair
/// of one router.
pub struct SwitchAllocator
{
	/// One arbiter per outport, over inport candidates.
	arbiters: Vec<RoundRobinArbiter>,
}

impl SwitchAllocator
{
	pub fn new(num_outports:usize, num_inports:usize) -> SwitchAllocator
	{
		SwitchAllocator{ arbiters: (0..num_outports).map(|_|RoundRobinArbiter::new(num_inports)).collect() }
	}

	/// Runs stage 1 (per-inport nomination) and stage 2 (per-outport
	/// arbitration), mutating VC/credit state for every grant and
	/// returning the grant list for the crossbar to execute.
	///
	/// `halt` suppresses granting entirely (§4.7: "halt suppresses any
	/// flit departure from this router's OutputUnits", used during SPIN).
	#[allow(clippy::too_many_arguments)]
	pub fn allocate(&mut self, current_cycle:crate::event::Time, halt:bool, input_units:&mut [InputUnit], output_units:&mut [OutputUnit], routing:&RoutingUnit) -> Result<Vec<Grant>,Error>
	{
		let mut grants = Vec::new();
		if halt { return Ok(grants); }

		// Stage 1: each inport nominates at most one (vc,outport) request.
		struct Nomination { inport:usize, vc:usize, outport:usize, is_head:bool }
		let mut nominations:Vec<Nomination> = Vec::new();
		for (inport,iu) in input_units.iter().enumerate()
		{
			if routing.inport_direction_of(inport)==Direction::Local && iu.num_vcs()==0 { continue; }
			'vc_search: for vc in 0..iu.num_vcs()
			{
				let vstate = iu.vc(vc).state;
				if vstate != VcState::VcAb && vstate != VcState::Active { continue; }
				let flit = match iu.peek_top_flit(vc) { Some(f)=>f, None=>continue };
				let outport = if let Some(p) = iu.vc(vc).outport { p } else { routing.outport_compute(flit,inport) };
				let is_head = flit.is_head();
				let eligible = if is_head
				{
					// HEAD needs a free downstream VC to allocate.
					(0..output_units[outport].num_vcs()).any(|ovc|output_units[outport].state(ovc)==VcState::Idle)
				}
				else
				{
					// BODY/TAIL ride the VC already allocated at HEAD time.
					iu.vc(vc).outport.is_some()
				};
				if eligible
				{
					nominations.push(Nomination{ inport, vc, outport, is_head });
					break 'vc_search;
				}
			}
		}

		// Stage 2: per outport, arbitrate among the inports that nominated it.
		for outport in 0..output_units.len()
		{
			let candidates:Vec<usize> = nominations.iter().filter(|n|n.outport==outport).map(|n|n.inport).collect();
			let winner_inport = match self.arbiters[outport].pick(&candidates) { Some(w)=>w, None=>continue };
			let nomination = nominations.iter().find(|n|n.outport==outport && n.inport==winner_inport).unwrap();
			let vc = nomination.vc;

			let out_vc = if nomination.is_head
			{
				let free = (0..output_units[outport].num_vcs()).find(|&ovc|output_units[outport].state(ovc)==VcState::Idle);
				let free = match free { Some(v)=>v, None=>continue };
				input_units[winner_inport].vc_mut(vc).outport = Some(outport);
				input_units[winner_inport].vc_mut(vc).bound_out_vc = Some(free);
				output_units[outport].set_vc_state(VcState::VcAb,free,current_cycle);
				free
			}
			else
			{
				// BODY/TAIL: reuse exactly the downstream VC the HEAD bound
				// at allocation time (§3 VC exclusivity).
				downstream_vc_of(input_units,winner_inport,vc)
			};

			if !output_units[outport].has_credit(out_vc) { continue; }
			output_units[outport].decrement_credit(out_vc)?;
			if nomination.is_head
			{
				output_units[outport].set_vc_state(VcState::Active,out_vc,current_cycle);
			}
			grants.push(Grant{ inport: winner_inport, vc, outport, out_vc });
		}
		Ok(grants)
	}
}

/// Tracks, for an already-allocated (inport,vc), which downstream VC it
/// was bound to at HEAD time. Stored directly on the `VirtualChannel`
/// via a side table would duplicate `InputUnit::vc().outport`'s role as
/// "claimed an outport"; here we additionally need *which vc on that
/// outport*, so body/tail grants reuse exactly the HEAD's allocation.
fn downstream_vc_of(input_units:&[InputUnit], inport:usize, vc:usize) -> usize
{
	input_units[inport].vc(vc).bound_out_vc.expect("BODY/TAIL flit arbitrated without a HEAD-time VC allocation")
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn round_robin_advances_past_winner()
	{
		let mut arb = RoundRobinArbiter::new(4);
		assert_eq!(arb.pick(&[0,1,2]),Some(0));
		assert_eq!(arb.pick(&[0,1,2]),Some(1));
		assert_eq!(arb.pick(&[0,2]),Some(2));
		// pointer now at 3; among {0,1} the nearest forward is 0.
		assert_eq!(arb.pick(&[0,1]),Some(0));
	}

	#[test]
	fn no_candidates_grants_nothing()
	{
		let mut arb = RoundRobinArbiter::new(4);
		assert_eq!(arb.pick(&[]),None);
	}
}
