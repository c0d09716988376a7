use garnet_spin::direction::Direction;
use garnet_spin::event::Time;
use garnet_spin::params::Params;

/// Builds a square `side x side` mesh with `num_vnets` virtual networks,
/// one VC each, and the given per-VC buffer depth. Mirrors the shape of
/// the teacher's small `*Builder` structs (one struct per thing under
/// test), narrowed to the one topology this crate supports.
pub struct MeshBuilder
{
    pub side: usize,
    pub num_vnets: usize,
    pub buffer_depth: usize,
    pub link_latency: Time,
}

impl MeshBuilder
{
    pub fn build(self) -> Params
    {
        let mut params = Params::mesh(self.side,self.side,self.num_vnets);
        params.buffer_depth = self.buffer_depth;
        params.link_latency = self.link_latency;
        params
    }
}

/// The four-router ring used throughout the seed tests: closes on router 0
/// via the implicit `(0,North)` node (last listed router is `num_rows==2`).
pub fn four_router_ring() -> Vec<(usize,Direction)>
{
    vec![(1,Direction::West),(3,Direction::South),(2,Direction::East)]
}
