/*!

The credit return token, grounded on `AcknowledgeMessage` in
`router/mod.rs` — the teacher's own "tell the emissor a slot freed up"
message, narrowed here to the `(vc_id, is_free_signal)` pair named in
§2 of the spec.

*/

use quantifiable_derive::Quantifiable;
use crate::quantify::Quantifiable;

#[derive(Debug,Clone,Copy,Quantifiable)]
pub struct Credit
{
	pub vc: usize,
	/// `true` when the VC just emptied out entirely (its upstream state
	/// should be marked IDLE as well as its credit incremented).
	pub is_free_signal: bool,
}

impl Credit
{
	pub fn new(vc:usize, is_free_signal:bool) -> Credit
	{
		Credit{ vc, is_free_signal }
	}
}
