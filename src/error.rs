/*!

This module is for managing errors in the code of this crate, to avoid invoking `panic!` in favor of a more graceful exit. Cases that should never happen in correctly-configured code are kept as `panic!`; everything reachable from external configuration goes through `Error`.

Instead of `expect` or `unwrap_or_else` try
* `map_err` like in `.map_err(|e|Error::could_not_open_file(source_location!(),path,e))?;`
* `ok_or_else` like in `.ok_or_else(||Error::ill_formed_spin_ring(source_location!(),"ring is empty".to_string()))?;`

Instead of `panic!` try
* Return an error. E.g., by `return Err(error!(vc_overflow,router_index,port,vc));`

The `error!` macro eases the writing a little. E.g., `error!(vc_overflow,router_index,port,vc)` or `error!(lock_already_held,held_by,requested_by)`.

When displaying errors
* Write to the standard error instead of to the standard output. I.e., with `eprintln!` instead of `println!`.
* If you need to exit the application you may use `std::process::exit` instead of `panic!`.

*/

use std::fmt::{Display,Formatter};
use std::path::PathBuf;

/// The main Error class to be used in each `Result(Whatever,Error)`.
/// It contains the code source of the error and its kind.
/// An arbitrary `String` message can be optionally attached.
#[derive(Debug)]
pub struct Error
{
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	pub message: Option<String>,
}

/// A source code location where an error occurred.
/// Contains the values of the macros `std::{file,line,column}`.
#[derive(Debug)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
	pub column: u32,
}

/// The taxonomy named in the spec's error-handling design: `ConfigError`
/// variants are fatal at init (before any cycle runs); `InvariantViolation`
/// variants are bugs, not runtime conditions, and abort immediately.
#[derive(Debug)]
pub enum ErrorKind
{
	// --- ConfigError ---
	/// The spin ring configuration file could not be opened.
	CouldNotOpenFile{
		filepath: PathBuf,
		error: std::io::Error,
	},
	/// A direction token in the ring file was not one of `N|n|E|e|S|s|W|w`.
	UnknownDirectionToken{
		token: String,
	},
	/// The ring file's tokens did not pair up into `(router_id, direction)`, or the
	/// ring otherwise could not be parsed.
	IllFormedSpinRing{
		reason: String,
	},
	/// The ring does not close: the last listed router is not adjacent to router 0.
	RingDoesNotClose{
		last_router: usize,
	},
	/// A `make_*_link` construction call referenced a router or NI id outside the topology.
	BadTopologyReference{
		description: String,
	},
	/// `Params::validate` rejected the configuration before any router was built.
	InvalidParams{
		reason: String,
	},

	// --- InvariantViolation ---
	/// `InputUnit::wakeup` tried to enqueue a flit into a full VC.
	VcOverflow{
		router_index: usize,
		port: usize,
		vc: usize,
	},
	/// A credit counter was decremented below zero.
	CreditUnderflow{
		router_index: usize,
		port: usize,
		vc: usize,
	},
	/// SPIN's Stage A and Stage B moved a different number of flits.
	SpinCountMismatch{
		removed: usize,
		inserted: usize,
	},
	/// Two routers attempted to hold `GarnetNetwork.lock` simultaneously.
	LockAlreadyHeld{
		held_by: usize,
		requested_by: usize,
	},
	/// A `hops_needed_before_spin`/`hops_needed_after_spin` sentinel was not
	/// `-1` when the protocol required it to be unset.
	SpinSentinelNotReset{
		field: &'static str,
	},
	/// `chck_link_state` found a non-empty link buffer while `lock != -1`.
	LinkNotQuiescent{
		router_index: usize,
		port: usize,
	},

	/// Any other error. Better to add new types than to use this thing.
	Undetermined,
}

use ErrorKind::*;

impl Error
{
	pub fn new(source_location:SourceLocation, kind:ErrorKind) -> Error
	{
		Error{ source_location, kind, message: None }
	}
	pub fn with_message(mut self,message:String) -> Error
	{
		match self.message
		{
			Some(ref mut text) => *text += &message,
			None => self.message = Some(message),
		}
		self
	}
	pub fn could_not_open_file(source_location:SourceLocation,filepath:PathBuf,error:std::io::Error) -> Error
	{
		Error::new(source_location, CouldNotOpenFile{ filepath, error })
	}
	pub fn unknown_direction_token(source_location:SourceLocation,token:String) -> Error
	{
		Error::new(source_location, UnknownDirectionToken{ token })
	}
	pub fn ill_formed_spin_ring(source_location:SourceLocation,reason:String) -> Error
	{
		Error::new(source_location, IllFormedSpinRing{ reason })
	}
	pub fn ring_does_not_close(source_location:SourceLocation,last_router:usize) -> Error
	{
		Error::new(source_location, RingDoesNotClose{ last_router })
	}
	pub fn bad_topology_reference(source_location:SourceLocation,description:String) -> Error
	{
		Error::new(source_location, BadTopologyReference{ description })
	}
	pub fn invalid_params(source_location:SourceLocation,reason:String) -> Error
	{
		Error::new(source_location, InvalidParams{ reason })
	}
	pub fn vc_overflow(source_location:SourceLocation,router_index:usize,port:usize,vc:usize) -> Error
	{
		Error::new(source_location, VcOverflow{ router_index, port, vc })
	}
	pub fn credit_underflow(source_location:SourceLocation,router_index:usize,port:usize,vc:usize) -> Error
	{
		Error::new(source_location, CreditUnderflow{ router_index, port, vc })
	}
	pub fn spin_count_mismatch(source_location:SourceLocation,removed:usize,inserted:usize) -> Error
	{
		Error::new(source_location, SpinCountMismatch{ removed, inserted })
	}
	pub fn lock_already_held(source_location:SourceLocation,held_by:usize,requested_by:usize) -> Error
	{
		Error::new(source_location, LockAlreadyHeld{ held_by, requested_by })
	}
	pub fn spin_sentinel_not_reset(source_location:SourceLocation,field:&'static str) -> Error
	{
		Error::new(source_location, SpinSentinelNotReset{ field })
	}
	pub fn link_not_quiescent(source_location:SourceLocation,router_index:usize,port:usize) -> Error
	{
		Error::new(source_location, LinkNotQuiescent{ router_index, port })
	}
	pub fn undetermined(source_location:SourceLocation) -> Error
	{
		Error::new(source_location, Undetermined)
	}

	/// `true` for the `ConfigError` branch of the taxonomy: fatal at init,
	/// before any cycle has run.
	pub fn is_config_error(&self) -> bool
	{
		matches!(self.kind, CouldNotOpenFile{..} | UnknownDirectionToken{..} | IllFormedSpinRing{..} | RingDoesNotClose{..} | BadTopologyReference{..} | InvalidParams{..})
	}
}

// source_location!()
#[macro_export]
macro_rules! source_location{
	() => {
		$crate::error::SourceLocation{
			file: file!(),
			line: line!(),
			column: column!(),
		}
	}
}
#[macro_export]
macro_rules! error{
	($kind:ident,$($args:tt)*) => {{
		$crate::error::Error::$kind( $crate::source_location!(), $($args)* )
	}};
	($kind:ident) => {{
		$crate::error::Error::$kind( $crate::source_location!() )
	}};
}

impl Display for Error
{
	fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), std::fmt::Error>
	{
		let Error{source_location:location,kind,message} = self;
		writeln!(formatter,"Error at file {} at line {} column {}.",location.file,location.line,location.column)?;
		if let Some(text) = message
		{
			writeln!(formatter,"{}",text)?;
		}
		kind.fmt(formatter)?;
		Ok(())
	}
}

impl Display for ErrorKind
{
	fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), std::fmt::Error>
	{
		match self
		{
			CouldNotOpenFile{filepath,error} =>
			{
				writeln!(formatter,"CouldNotOpenFile error: the file {:?} could not be opened.\nio_error: {}",filepath,error)?;
			},
			UnknownDirectionToken{token} =>
			{
				writeln!(formatter,"UnknownDirectionToken error: the ring-file token {:?} is not one of N,n,E,e,S,s,W,w.",token)?;
			},
			IllFormedSpinRing{reason} =>
			{
				writeln!(formatter,"IllFormedSpinRing error: {}",reason)?;
			},
			RingDoesNotClose{last_router} =>
			{
				writeln!(formatter,"RingDoesNotClose error: the ring's last router {} is adjacent to neither router 0 eastward nor router 0 northward.",last_router)?;
			},
			BadTopologyReference{description} =>
			{
				writeln!(formatter,"BadTopologyReference error: {}",description)?;
			},
			InvalidParams{reason} =>
			{
				writeln!(formatter,"InvalidParams error: {}",reason)?;
			},
			VcOverflow{router_index,port,vc} =>
			{
				writeln!(formatter,"VcOverflow error: router {} port {} vc {} received a flit while already full.",router_index,port,vc)?;
			},
			CreditUnderflow{router_index,port,vc} =>
			{
				writeln!(formatter,"CreditUnderflow error: router {} port {} vc {} credit counter would go negative.",router_index,port,vc)?;
			},
			SpinCountMismatch{removed,inserted} =>
			{
				writeln!(formatter,"SpinCountMismatch error: SPIN removed {} flits in Stage A but inserted {} in Stage B.",removed,inserted)?;
			},
			LockAlreadyHeld{held_by,requested_by} =>
			{
				writeln!(formatter,"LockAlreadyHeld error: router {} requested the SPIN lock while router {} already holds it.",requested_by,held_by)?;
			},
			SpinSentinelNotReset{field} =>
			{
				writeln!(formatter,"SpinSentinelNotReset error: field {} was not -1 when the protocol required it unset.",field)?;
			},
			LinkNotQuiescent{router_index,port} =>
			{
				writeln!(formatter,"LinkNotQuiescent error: router {} port {} still had a flit in flight while the SPIN lock was held.",router_index,port)?;
			},
			Undetermined =>
			{
				writeln!(formatter,"Undetermined error: a generic error. The concrete error should be more specified.")?;
			},
		}
		Ok(())
	}
}

impl std::error::Error for Error {}
