/*!

Shared virtual-channel state enum (§3): `Idle`, `VcAb` (vc-allocated,
waiting on switch allocation), `Active` (currently transmitting a
packet). Used by both `InputUnit` (the VC a flit sits in) and
`OutputUnit` (the VC an upstream packet has claimed downstream),
grounded on the allocation-state bookkeeping in `router/basic.rs`'s
`selected_input`/`selected_output` fields.

*/

use crate::quantify::Quantifiable;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum VcState
{
	Idle,
	/// VC has been allocated to a packet (at HEAD) but has not yet won switch allocation.
	VcAb,
	Active,
}

impl Quantifiable for VcState
{
	fn total_memory(&self) -> usize { std::mem::size_of::<VcState>() }
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { std::mem::size_of::<VcState>() }
}
