use std::sync::Arc;

use crate::error::Error;
use crate::error::Result;
use crate::inspect::verify_skip_graph;
use crate::skipgraph::Side;
use crate::swarm::Swarm;
use crate::tests::default::collect_tables;
use crate::tests::default::find;
use crate::tests::default::neighbour_key;
use crate::tests::default::prepare_scenario_b;

fn survivors(swarms: &[Arc<Swarm>], gone: &[u32]) -> Vec<Arc<Swarm>> {
    swarms
        .iter()
        .filter(|s| s.routing_table().unwrap().is_some())
        .filter(|s| !gone.contains(&s.my_node().unwrap().key))
        .cloned()
        .collect()
}

fn assert_forgotten(swarms: &[Arc<Swarm>], key: u32) {
    for swarm in swarms {
        let table = swarm.routing_table().unwrap().unwrap();
        for level in 0..table.height() {
            for side in Side::both() {
                assert_ne!(
                    neighbour_key(&table, level, side),
                    Some(key),
                    "{} still referenced by {}\n{}",
                    key,
                    table.key(),
                    table
                );
            }
        }
    }
}

#[tokio::test]
async fn test_leave_from_the_middle() -> Result<()> {
    let swarms = prepare_scenario_b().await;
    let leaving = find(&swarms, 33).clone();

    assert!(leaving.leave().await?);
    assert!(leaving.routing_table()?.is_none());
    assert!(matches!(
        leaving.my_node(),
        Err(Error::RoutingTableNotInitialized)
    ));

    let rest = survivors(&swarms, &[33]);
    assert_eq!(rest.len(), 6);
    assert_forgotten(&rest, 33);
    assert_eq!(verify_skip_graph(&collect_tables(&rest)), vec![]);

    let t13 = find(&rest, 13).routing_table()?.unwrap();
    assert_eq!(neighbour_key(&t13, 1, Side::Right), Some(36));
    let t36 = find(&rest, 36).routing_table()?.unwrap();
    assert_eq!(neighbour_key(&t36, 0, Side::Left), Some(21));
    assert_eq!(neighbour_key(&t36, 2, Side::Left), None);

    for swarm in rest.iter() {
        assert_eq!(swarm.search(34).await?.node.key, 21);
        assert_eq!(swarm.search(36).await?.node.key, 36);
    }
    Ok(())
}

#[tokio::test]
async fn test_leave_at_both_ends() -> Result<()> {
    let swarms = prepare_scenario_b().await;

    assert!(find(&swarms, 99).leave().await?);
    assert!(find(&swarms, 13).leave().await?);

    let rest = survivors(&swarms, &[13, 99]);
    assert_eq!(rest.len(), 5);
    assert_forgotten(&rest, 13);
    assert_forgotten(&rest, 99);
    assert_eq!(verify_skip_graph(&collect_tables(&rest)), vec![]);

    for swarm in rest.iter() {
        assert_eq!(swarm.search(1).await?.node.key, 21);
        assert_eq!(swarm.search(100).await?.node.key, 75);
    }
    Ok(())
}

#[tokio::test]
async fn test_members_leave_one_by_one() -> Result<()> {
    let swarms = prepare_scenario_b().await;
    let mut gone = vec![];
    for key in [48, 21, 75, 36] {
        assert!(find(&swarms, key).leave().await?);
        gone.push(key);

        let rest = survivors(&swarms, &gone);
        for key in gone.iter() {
            assert_forgotten(&rest, *key);
        }
        assert_eq!(verify_skip_graph(&collect_tables(&rest)), vec![]);
    }

    // only 13, 33 and 99 remain
    let rest = survivors(&swarms, &gone);
    assert_eq!(rest.len(), 3);
    assert_eq!(rest[0].search(50).await?.node.key, 33);
    Ok(())
}

#[tokio::test]
async fn test_last_member_leaves() -> Result<()> {
    let swarm = crate::tests::default::prepare_swarm(1, &[0, 0]);
    swarm.join(None).await?;
    assert!(swarm.leave().await?);
    assert!(swarm.routing_table()?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_leave_past_unreachable_right_neighbour() -> Result<()> {
    let swarms = prepare_scenario_b().await;
    find(&swarms, 75).shutdown().await?;

    // 48 cannot reach 75, so 36 is told to drop 48 instead
    assert!(!find(&swarms, 48).leave().await?);

    let rest = survivors(&swarms, &[48, 75]);
    assert_eq!(rest.len(), 5);
    assert_forgotten(&rest, 48);
    let t36 = find(&rest, 36).routing_table()?.unwrap();
    assert_eq!(neighbour_key(&t36, 0, Side::Right), None);
    assert_eq!(neighbour_key(&t36, 1, Side::Right), None);
    Ok(())
}

#[tokio::test]
async fn test_adjacent_members_leave_together() -> Result<()> {
    for (a, b) in [(33, 36), (13, 21), (75, 99)] {
        let swarms = prepare_scenario_b().await;
        let (left_a, left_b) = tokio::join!(find(&swarms, a).leave(), find(&swarms, b).leave());
        assert!(left_a?, "{} left with unconfirmed steps", a);
        assert!(left_b?, "{} left with unconfirmed steps", b);

        let rest = survivors(&swarms, &[a, b]);
        assert_eq!(rest.len(), 5);
        assert_forgotten(&rest, a);
        assert_forgotten(&rest, b);
        assert_eq!(
            verify_skip_graph(&collect_tables(&rest)),
            vec![],
            "{} and {} leaving together",
            a,
            b
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_departed_member_passes_on_repairs() -> Result<()> {
    let swarms = prepare_scenario_b().await;
    let s36 = find(&swarms, 36).clone();
    let s99 = find(&swarms, 99).clone();
    let node36 = s36.my_node()?;
    let node99 = s99.my_node()?;
    assert!(s36.leave().await?);
    assert!(s99.leave().await?);

    // a late Delete to 36 is passed on to its former right neighbour 48
    let s33 = find(&swarms, 33).clone();
    assert!(s33.message_handler.request_delete(&node36, 0).await?);

    // 99 had no right neighbour, the late Delete is answered with NoNeighbour
    let s75 = find(&swarms, 75).clone();
    assert!(!s75.message_handler.request_delete(&node99, 0).await?);

    let rest = survivors(&swarms, &[36, 99]);
    assert_forgotten(&rest, 36);
    assert_forgotten(&rest, 99);
    assert_eq!(verify_skip_graph(&collect_tables(&rest)), vec![]);
    let t48 = find(&rest, 48).routing_table()?.unwrap();
    assert_eq!(neighbour_key(&t48, 0, Side::Left), Some(33));
    assert_eq!(s33.pending_requests(), 0);
    Ok(())
}
