/*!

A cycle-accurate Garnet-style NoC router fabric with SPIN deadlock
recovery: a synchronous flit-level mesh interconnect (virtual-channel
flow control, credit-based backpressure, two-stage switch allocation,
XY dimension-order routing) plus a periodic ring-rotation protocol that
breaks channel-dependency cycles without dropping a flit.

`GarnetNetwork` is the crate's entry point: build one with
[`GarnetNetwork::new`] from a [`params::Params`], inject packets with
[`GarnetNetwork::inject_packet`], and drive it cycle by cycle through
the [`event::Eventful`] contract (an [`event::EventQueue`] is provided
for standalone use; an embedding harness may supply its own).

*/

#[macro_use]
pub mod error;

pub mod allocator;
pub mod credit;
pub mod crossbar;
pub mod direction;
pub mod event;
pub mod flit;
pub mod input_unit;
pub mod link;
pub mod network;
pub mod ni;
pub mod output_unit;
pub mod params;
pub mod quantify;
pub mod router;
pub mod routing;
pub mod spin;
pub mod stats;
pub mod topology;
pub mod vc_state;

pub use crate::direction::Direction;
pub use crate::error::{Error,ErrorKind};
pub use crate::event::{Eventful,EventGeneration,EventQueue,Time,WakeupResult};
pub use crate::flit::{Flit,FlitType,NetDest,RouteInfo,Stage};
pub use crate::network::GarnetNetwork;
pub use crate::ni::{EjectedFlit,NetworkInterface};
pub use crate::params::Params;
pub use crate::router::Router;
pub use crate::routing::{MeshCoord,RoutingUnit};
pub use crate::spin::{RotationReport,SpinRing};
pub use crate::stats::{InMemorySink,StatisticsSink};
pub use crate::topology::MeshTopology;
