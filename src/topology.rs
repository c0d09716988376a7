/*!

Mesh construction (§4.8), grounded on the topology-building callers that
feed `router/basic.rs`'s `Basic::new` one `RoutingInfo`/link set at a
time, narrowed here to the one fixed topology this crate supports: a
rectangular mesh with one network interface per router, wired in XY
order. `MeshTopology::build` is the only place `make_ext_in_link`,
`make_ext_out_link` and `make_internal_link` style wiring happens; it
hands back fully-formed `Router`s ready for `GarnetNetwork` to drive.

*/

use crate::direction::Direction;
use crate::error::Error;
use crate::input_unit::InputUnit;
use crate::link::{CreditLink,LinkKind,NetworkLink};
use crate::output_unit::OutputUnit;
use crate::params::Params;
use crate::router::Router;
use crate::routing::{MeshCoord,RoutingUnit};

fn coord_of(router_id:usize, num_cols:usize) -> MeshCoord
{
	MeshCoord{ x: router_id%num_cols, y: router_id/num_cols }
}

/// Builds every `Router` in an `num_rows x num_cols` mesh (§4.1, §4.8).
/// Internal ports are wired to their mesh neighbour; the `Local` port on
/// every router is left with no router on the other end (`downstream_router`/
/// `credit_return_link.upstream_router` both `None`) for `GarnetNetwork` to
/// hand to a `NetworkInterface` instead.
pub struct MeshTopology;

impl MeshTopology
{
	pub fn build(params:&Params) -> Result<Vec<Router>,Error>
	{
		params.validate()?;
		let num_rows = params.num_rows;
		let num_cols = params.num_cols;
		let num_routers = params.num_routers();
		let total_vcs = params.total_vcs();

		// Every router's routing unit first, its own fallback table filled
		// in immediately (§4.1/§4.4: the table mirrors what `outport_compute`
		// would pick, so a flit re-routed onto an unexpected inport by SPIN
		// still finds an entry instead of relying on the preferred-direction
		// shortcut), before any cross-router port lookups are needed.
		let mut routings:Vec<RoutingUnit> = (0..num_routers)
			.map(|id|RoutingUnit::new_mesh(id,coord_of(id,num_cols),num_rows,num_cols,num_routers))
			.collect();
		for router_id in 0..num_routers
		{
			for dest in 0..num_routers
			{
				if dest==router_id { continue; }
				let preferred_dir = routings[router_id].xy_preferred_direction(dest);
				if let Some(port) = routings[router_id].port_of(preferred_dir)
				{
					routings[router_id].add_table_entry(port,dest);
				}
			}
		}

		// Every router's ports, referencing neighbours by index while
		// `routings` is still a plain `Vec` (no partial moves yet).
		let mut all_input_units = Vec::with_capacity(num_routers);
		let mut all_output_units = Vec::with_capacity(num_routers);
		let mut all_credit_return_links = Vec::with_capacity(num_routers);
		for router_id in 0..num_routers
		{
			let routing = &routings[router_id];
			let num_ports = routing.num_ports();
			let mut input_units = Vec::with_capacity(num_ports);
			let mut output_units = Vec::with_capacity(num_ports);
			let mut credit_return_links = Vec::with_capacity(num_ports);

			for port in 0..num_ports
			{
				let dir = routing.direction_of(port);
				if dir==Direction::Local
				{
					input_units.push(InputUnit::new(router_id,port,dir,total_vcs,params.buffer_depth,
						NetworkLink::new(LinkKind::ExtIn,params.ext_link_latency),None,0));
					output_units.push(OutputUnit::new(router_id,port,dir,total_vcs,params.buffer_depth,
						NetworkLink::new(LinkKind::ExtOut,params.ext_link_latency),None,0));
					credit_return_links.push(CreditLink::new(params.ext_link_latency));
					continue;
				}

				let neighbour_coord = RoutingUnit::neighbour_coord(routing.coord,dir,num_rows,num_cols)
					.ok_or_else(||error!(bad_topology_reference,format!("router {} port {} ({:?}) has no mesh neighbour",router_id,port,dir)))?;
				let neighbour_id = neighbour_coord.y*num_cols + neighbour_coord.x;
				let neighbour_port = routings[neighbour_id].port_of(dir.opposite())
					.ok_or_else(||error!(bad_topology_reference,format!("router {} has no port facing router {}",neighbour_id,router_id)))?;

				// An internal hop's full configured latency lives on the
				// *upstream* OutputUnit's pipeline; the downstream InputUnit's
				// own pipeline only models `GarnetNetwork`'s one-cycle relay
				// step (an OutputUnit's outbound link and the neighbour's
				// InputUnit's inbound link cannot be the same owned value in
				// Rust, so the single physical link is split into two, with
				// the relay adding one cycle versus the literal link latency
				// — see DESIGN.md).
				input_units.push(InputUnit::new(router_id,port,dir,total_vcs,params.buffer_depth,
					NetworkLink::new(LinkKind::Internal,1),Some(neighbour_id),neighbour_port));
				output_units.push(OutputUnit::new(router_id,port,dir,total_vcs,params.buffer_depth,
					NetworkLink::new(LinkKind::Internal,params.link_latency),Some(neighbour_id),neighbour_port));
				credit_return_links.push(CreditLink::new(params.link_latency));
			}

			all_input_units.push(input_units);
			all_output_units.push(output_units);
			all_credit_return_links.push(credit_return_links);
		}

		let routers = routings.into_iter().enumerate()
			.map(|(router_id,routing)|Router::new(router_id,routing,all_input_units[router_id].drain(..).collect(),all_output_units[router_id].drain(..).collect(),all_credit_return_links[router_id].drain(..).collect()))
			.collect();
		Ok(routers)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn builds_a_2x2_mesh_with_four_routers()
	{
		let params = Params::mesh(2,2,1);
		let routers = MeshTopology::build(&params).unwrap();
		assert_eq!(routers.len(),4);
		assert_eq!(routers[0].num_inports(),3); // East, North, Local
		assert_eq!(routers[3].num_inports(),3); // South, West, Local
	}

	#[test]
	fn internal_ports_point_at_the_right_neighbour()
	{
		let params = Params::mesh(2,2,1);
		let routers = MeshTopology::build(&params).unwrap();
		let east0 = routers[0].routing().port_of(Direction::East).unwrap();
		assert_eq!(routers[0].input_units()[east0].credit_return_link.upstream_router,Some(1));
		assert_eq!(routers[0].output_units()[east0].downstream_router,Some(1));
	}

	#[test]
	fn local_ports_have_no_router_on_the_other_end()
	{
		let params = Params::mesh(2,2,1);
		let routers = MeshTopology::build(&params).unwrap();
		let local0 = routers[0].routing().port_of(Direction::Local).unwrap();
		assert_eq!(routers[0].output_units()[local0].downstream_router,None);
		assert_eq!(routers[0].input_units()[local0].credit_return_link.upstream_router,None);
	}

	#[test]
	fn rejects_degenerate_dimensions()
	{
		let params = Params::mesh(0,2,1);
		assert!(MeshTopology::build(&params).is_err());
	}
}
