/*!

Symbolic port directions, as named by §6 of the spec: routers and
network interfaces are wired through `{North,East,South,West,Local}`
rather than raw port indices, matching the teacher's convention of
naming topology edges by direction (`routing/updown.rs`'s
`Location::RouterPort`/`Location::ServerPort`) generalised to the fixed
mesh directions Garnet uses.

*/

use std::fmt;
use crate::error::{Error,SourceLocation};
use crate::quantify::Quantifiable;
use crate::source_location;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub enum Direction
{
	North,
	East,
	South,
	West,
	/// The port facing this router's own network interface.
	Local,
}

impl Direction
{
	/// The direction one would face coming back the way you came.
	pub fn opposite(self) -> Direction
	{
		match self
		{
			Direction::North => Direction::South,
			Direction::South => Direction::North,
			Direction::East => Direction::West,
			Direction::West => Direction::East,
			Direction::Local => Direction::Local,
		}
	}

	/// Parses one of the ring-file direction tokens (§6): `N|n|E|e|S|s|W|w`.
	/// Any other token is a fatal configuration error.
	pub fn parse_ring_token(token:&str) -> Result<Direction,Error>
	{
		match token
		{
			"N" | "n" => Ok(Direction::North),
			"E" | "e" => Ok(Direction::East),
			"S" | "s" => Ok(Direction::South),
			"W" | "w" => Ok(Direction::West),
			_ => Err(Error::unknown_direction_token(source_location!(),token.to_string())),
		}
	}

	/// All four mesh-facing directions, in a fixed deterministic order
	/// used to break switch-allocation and routing ties (§4.4).
	pub fn mesh_order() -> [Direction;4]
	{
		[Direction::North,Direction::East,Direction::South,Direction::West]
	}
}

impl Quantifiable for Direction
{
	fn total_memory(&self) -> usize { std::mem::size_of::<Direction>() }
	fn print_memory_breakdown(&self) {}
	fn forecast_total_memory(&self) -> usize { std::mem::size_of::<Direction>() }
}

impl fmt::Display for Direction
{
	fn fmt(&self, f:&mut fmt::Formatter<'_>) -> fmt::Result
	{
		let s = match self
		{
			Direction::North => "North",
			Direction::East => "East",
			Direction::South => "South",
			Direction::West => "West",
			Direction::Local => "Local",
		};
		write!(f,"{}",s)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn opposite_is_involutive()
	{
		for d in [Direction::North,Direction::East,Direction::South,Direction::West,Direction::Local]
		{
			assert_eq!(d.opposite().opposite(),d);
		}
	}

	#[test]
	fn parses_case_insensitively()
	{
		assert_eq!(Direction::parse_ring_token("e").unwrap(),Direction::East);
		assert_eq!(Direction::parse_ring_token("N").unwrap(),Direction::North);
		assert!(Direction::parse_ring_token("Q").is_err());
	}
}
