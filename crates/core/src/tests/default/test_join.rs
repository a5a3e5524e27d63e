use std::sync::Arc;

use crate::error::Error;
use crate::error::Result;
use crate::inspect::verify_skip_graph;
use crate::skipgraph::Side;
use crate::swarm::transport::DummyTransport;
use crate::swarm::SwarmBuilder;
use crate::tests::default::collect_tables;
use crate::tests::default::find;
use crate::tests::default::join_via;
use crate::tests::default::neighbour_key;
use crate::tests::default::prepare_scenario_b;
use crate::tests::default::prepare_swarm;

#[tokio::test]
async fn test_first_member_joins_alone() -> Result<()> {
    let swarm = prepare_swarm(7, &[0, 1]);
    swarm.join(None).await?;
    let table = swarm.routing_table()?.unwrap();
    assert_eq!(table.height(), 0);
    assert_eq!(swarm.search(3).await?.node.key, 7);
    assert_eq!(swarm.search(9).await?.node.key, 7);
    Ok(())
}

#[tokio::test]
async fn test_two_members() -> Result<()> {
    let node0 = prepare_swarm(0, &[0, 0]);
    let node1 = prepare_swarm(1, &[0, 1]);
    node0.join(None).await?;
    join_via(&node1, &node0).await?;

    let t0 = node0.routing_table()?.unwrap();
    let t1 = node1.routing_table()?.unwrap();
    assert_eq!(neighbour_key(&t0, 0, Side::Right), Some(1));
    assert_eq!(neighbour_key(&t1, 0, Side::Left), Some(0));
    // both share bit 0
    assert_eq!(neighbour_key(&t0, 1, Side::Right), Some(1));
    assert_eq!(neighbour_key(&t1, 1, Side::Left), Some(0));
    assert_eq!(neighbour_key(&t1, 2, Side::Left), None);

    for swarm in [&node0, &node1] {
        assert_eq!(swarm.search(0).await?.node.key, 0);
        assert_eq!(swarm.search(1).await?.node.key, 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_seven_members_tables() -> Result<()> {
    let swarms = prepare_scenario_b().await;

    #[rustfmt::skip]
    let expected: [(u32, [[Option<u32>; 2]; 3]); 7] = [
        (13, [[None, Some(21)], [None, Some(33)], [None, Some(48)]]),
        (21, [[Some(13), Some(33)], [None, Some(75)], [None, None]]),
        (33, [[Some(21), Some(36)], [Some(13), Some(36)], [None, Some(36)]]),
        (36, [[Some(33), Some(48)], [Some(33), Some(48)], [Some(33), None]]),
        (48, [[Some(36), Some(75)], [Some(36), None], [Some(13), None]]),
        (75, [[Some(48), Some(99)], [Some(21), Some(99)], [None, Some(99)]]),
        (99, [[Some(75), None], [Some(75), None], [Some(75), None]]),
    ];
    for (key, levels) in expected {
        let table = find(&swarms, key).routing_table()?.unwrap();
        for (level, [left, right]) in levels.iter().enumerate() {
            assert_eq!(
                neighbour_key(&table, level, Side::Left),
                *left,
                "left of {} at level {}\n{}",
                key,
                level,
                table
            );
            assert_eq!(
                neighbour_key(&table, level, Side::Right),
                *right,
                "right of {} at level {}\n{}",
                key,
                level,
                table
            );
        }
    }

    assert_eq!(verify_skip_graph(&collect_tables(&swarms)), vec![]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_key_is_refused() -> Result<()> {
    let first = prepare_swarm(5, &[0, 1]);
    let second = prepare_swarm(5, &[1, 1]);
    first.join(None).await?;

    let res = join_via(&second, &first).await;
    assert!(matches!(res, Err(Error::DuplicateKey(5))));

    // nothing was linked on either side
    assert_eq!(first.routing_table()?.unwrap().height(), 0);
    assert_eq!(second.routing_table()?.unwrap().height(), 0);
    Ok(())
}

#[tokio::test]
async fn test_introduction_before_initialization() -> Result<()> {
    let first = prepare_swarm(1, &[0, 0]);
    let second = SwarmBuilder::new(Arc::new(DummyTransport::new()))
        .membership_vector_length(2)
        .build()?;

    // introduced before having a routing table, so no node info is exchanged one way
    second.introduce(&first.address()).await?;
    second.initialize_routing_table(2, None)?;
    assert!(second.discovery().lookup_peer_info(&first.address())?.is_some());
    assert!(first.discovery().lookup_peer_info(&second.address())?.is_none());

    let third = prepare_swarm(3, &[1, 1]);
    third.introduce(&second.address()).await?;
    // second never joined, its search finds only itself
    join_via(&third, &second).await?;
    assert_eq!(
        neighbour_key(&third.routing_table()?.unwrap(), 0, Side::Left),
        Some(2)
    );
    Ok(())
}

#[tokio::test]
async fn test_no_introducer_info() -> Result<()> {
    let first = SwarmBuilder::new(Arc::new(DummyTransport::new()))
        .membership_vector_length(2)
        .build()?;
    let second = prepare_swarm(2, &[0, 1]);

    // first has no routing table yet, so second learns nothing about it
    second.introduce(&first.address()).await?;
    assert!(matches!(second.join(None).await, Err(Error::NoIntroducer)));
    Ok(())
}

#[tokio::test]
async fn test_introduction_records_node_info() -> Result<()> {
    let a = prepare_swarm(10, &[0, 1]);
    let b = prepare_swarm(20, &[1, 0]);
    a.introduce(&b.address()).await?;

    let info_b = a.discovery().lookup_peer_info(&b.address())?.unwrap();
    let info_a = b.discovery().lookup_peer_info(&a.address())?.unwrap();
    assert_eq!(info_b.key, 20);
    assert_eq!(info_b.mv.to_string(), "10");
    assert_eq!(info_a.key, 10);
    assert_eq!(info_a.address, a.address());
    Ok(())
}
