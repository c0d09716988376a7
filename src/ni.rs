/*!

Network interface (§6: "NI adapters that translate host messages into
flits and back"), narrowed to a reference round-trip implementation.
Traffic generation policy — what to inject, and when — is explicitly
out of scope (§1); callers (tests, or an enclosing harness) decide that
and call `inject_packet` themselves. Grounded on the Head/Body/Tail
flit fragmentation implicit throughout `router/basic.rs`'s phit
handling, but expressed at the flit granularity this crate uses.

*/

use crate::error::Error;
use crate::event::Time;
use crate::flit::{Flit,FlitType,NetDest,RouteInfo};
use crate::router::Router;

/// One network interface, attached to exactly one router's `Local` port.
pub struct NetworkInterface
{
	pub router_id: usize,
	pub local_port: usize,
	num_nodes: usize,
	next_flit_id: u64,
	next_packet_id: u64,
	pub total_injected_flits: u64,
	pub total_ejected_flits: u64,
	pub marked_injected_flits: u64,
	pub marked_ejected_flits: u64,
}

/// What `receive` learned about one ejected flit, for the caller (usually
/// `GarnetNetwork`) to fold into latency/termination bookkeeping.
#[derive(Debug,Clone,Copy)]
pub struct EjectedFlit
{
	pub id: u64,
	pub pid: u64,
	pub latency: Time,
	pub is_marked: bool,
	pub is_tail: bool,
}

impl NetworkInterface
{
	pub fn new(router_id:usize, local_port:usize, num_nodes:usize) -> NetworkInterface
	{
		NetworkInterface{
			router_id, local_port, num_nodes,
			next_flit_id: 0, next_packet_id: 0,
			total_injected_flits: 0, total_ejected_flits: 0,
			marked_injected_flits: 0, marked_ejected_flits: 0,
		}
	}

	/// Fragments one packet of `num_flits` flits and injects it onto
	/// `router`'s `Local` inbound link (§4.2/§6). Returns the packet id.
	pub fn inject_packet(&mut self, router:&mut Router, dest_router:usize, dest_ni:usize, vnet:usize, vc:usize, num_flits:usize, is_marked:bool, current_cycle:Time) -> Result<u64,Error>
	{
		assert!(num_flits >= 1, "a packet must have at least one flit");
		let pid = self.next_packet_id;
		self.next_packet_id += 1;
		let route = RouteInfo{ dest_ni, dest_router, src_router: self.router_id, vnet, net_dest: NetDest::singleton(self.num_nodes,dest_router) };

		for i in 0..num_flits
		{
			let flit_type = if num_flits==1 { FlitType::HeadTail }
				else if i==0 { FlitType::Head }
				else if i==num_flits-1 { FlitType::Tail }
				else { FlitType::Body };
			let flit = Flit::new(self.next_flit_id,pid,vnet,vc,flit_type,route.clone(),num_flits,is_marked,current_cycle);
			self.next_flit_id += 1;
			router.push_inbound_flit(self.local_port,current_cycle,flit);
		}

		self.total_injected_flits += num_flits as u64;
		if is_marked { self.marked_injected_flits += num_flits as u64; }
		Ok(pid)
	}

	/// Records one flit's arrival at this NI's host, for `GarnetNetwork`'s
	/// relay step to call once it has popped it off the router's `Local`
	/// outbound link.
	pub fn receive(&mut self, flit:&Flit, current_cycle:Time) -> EjectedFlit
	{
		self.total_ejected_flits += 1;
		if flit.is_marked { self.marked_ejected_flits += 1; }
		EjectedFlit{
			id: flit.id, pid: flit.pid,
			latency: current_cycle.saturating_sub(flit.injection_cycle),
			is_marked: flit.is_marked,
			is_tail: flit.is_tail(),
		}
	}
}
