/*!

Memory accounting for live simulation state.

Every long-lived owner of flits or buffers in this crate implements
`Quantifiable` so that an embedding harness can report how much memory
the fabric is holding at any cycle, in the spirit of the teacher's own
per-structure `total_memory` implementations.

*/

use std::collections::VecDeque;
use std::mem::size_of;
use std::rc::Rc;

/// Something that can report how much memory it occupies.
pub trait Quantifiable
{
	/// Total memory used by this value, including heap allocations it owns.
	fn total_memory(&self) -> usize;
	/// Print a breakdown of the memory usage to stdout. Most implementors leave this unimplemented.
	fn print_memory_breakdown(&self);
	/// An estimate of the memory this value will occupy once fully populated.
	fn forecast_total_memory(&self) -> usize;
}

macro_rules! quantifiable_leaf
{
	($($t:ty),*) =>
	{
		$(
			impl Quantifiable for $t
			{
				fn total_memory(&self) -> usize { size_of::<$t>() }
				fn print_memory_breakdown(&self) {}
				fn forecast_total_memory(&self) -> usize { size_of::<$t>() }
			}
		)*
	}
}

quantifiable_leaf!(u8,u16,u32,u64,usize,i8,i16,i32,i64,isize,bool,f32,f64);

impl<T:Quantifiable> Quantifiable for Vec<T>
{
	fn total_memory(&self) -> usize
	{
		size_of::<Vec<T>>() + self.iter().map(|x|x.total_memory()).sum::<usize>()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize
	{
		size_of::<Vec<T>>() + self.capacity()*size_of::<T>()
	}
}

impl<T:Quantifiable> Quantifiable for VecDeque<T>
{
	fn total_memory(&self) -> usize
	{
		// VecDeque has a hole in its capacity accounting; +1 matches the
		// fudge factor the teacher's own `Buffer::total_memory` applies.
		size_of::<VecDeque<T>>() + self.iter().map(|x|x.total_memory()).sum::<usize>()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize
	{
		size_of::<VecDeque<T>>() + (self.capacity()+1)*size_of::<T>()
	}
}

impl<T> Quantifiable for Rc<T>
{
	fn total_memory(&self) -> usize
	{
		size_of::<Rc<T>>()
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize
	{
		size_of::<Rc<T>>()
	}
}

impl<T:Quantifiable> Quantifiable for Option<T>
{
	fn total_memory(&self) -> usize
	{
		size_of::<Option<T>>() + self.as_ref().map(|x|x.total_memory()).unwrap_or(0)
	}
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize
	{
		size_of::<Option<T>>()
	}
}
