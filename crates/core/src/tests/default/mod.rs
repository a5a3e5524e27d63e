use std::sync::Arc;
use std::time::Duration;

use crate::skipgraph::MembershipVector;
use crate::skipgraph::RoutingTable;
use crate::skipgraph::Side;
use crate::swarm::transport::DummyTransport;
use crate::swarm::Swarm;
use crate::swarm::SwarmBuilder;

mod test_concurrent_join;
mod test_join;
mod test_leave;
mod test_requests;
mod test_search;

/// Keys and membership vectors of the canonical seven member example.
pub const SCENARIO_B: [(u32, [u8; 2]); 7] = [
    (13, [0, 0]),
    (21, [1, 0]),
    (33, [0, 1]),
    (36, [0, 1]),
    (48, [0, 0]),
    (75, [1, 1]),
    (99, [1, 1]),
];

pub fn prepare_swarm_with_timeout(key: u32, mv: &[u8], timeout: Duration) -> Arc<Swarm> {
    let swarm = SwarmBuilder::new(Arc::new(DummyTransport::new()))
        .public_key(&key.to_be_bytes())
        .membership_vector_length(mv.len())
        .request_timeout(Some(timeout))
        .build()
        .unwrap();
    swarm
        .initialize_routing_table(key, Some(MembershipVector::from_bits(mv)))
        .unwrap();
    swarm
}

pub fn prepare_swarm(key: u32, mv: &[u8]) -> Arc<Swarm> {
    prepare_swarm_with_timeout(key, mv, Duration::from_secs(5))
}

/// Introduce `swarm` to `introducer` and join through it.
pub async fn join_via(swarm: &Swarm, introducer: &Swarm) -> crate::error::Result<()> {
    swarm.introduce(&introducer.address()).await?;
    swarm.join(None).await
}

/// Members joined one after another through the first one.
pub async fn prepare_graph(members: &[(u32, Vec<u8>)]) -> Vec<Arc<Swarm>> {
    let mut swarms: Vec<Arc<Swarm>> = vec![];
    for (key, mv) in members {
        let swarm = prepare_swarm(*key, mv);
        match swarms.first() {
            Some(first) => join_via(&swarm, first).await.unwrap(),
            None => swarm.join(None).await.unwrap(),
        }
        swarms.push(swarm);
    }
    swarms
}

pub async fn prepare_scenario_b() -> Vec<Arc<Swarm>> {
    let members: Vec<(u32, Vec<u8>)> = SCENARIO_B.iter().map(|(k, mv)| (*k, mv.to_vec())).collect();
    prepare_graph(&members).await
}

pub fn collect_tables(swarms: &[Arc<Swarm>]) -> Vec<RoutingTable> {
    swarms
        .iter()
        .filter_map(|s| s.routing_table().unwrap())
        .collect()
}

pub fn neighbour_key(table: &RoutingTable, level: usize, side: Side) -> Option<u32> {
    table.get(level, side).map(|n| n.key)
}

pub fn find<'a>(swarms: &'a [Arc<Swarm>], key: u32) -> &'a Arc<Swarm> {
    swarms
        .iter()
        .find(|s| s.my_node().map(|n| n.key).ok() == Some(key))
        .unwrap()
}
