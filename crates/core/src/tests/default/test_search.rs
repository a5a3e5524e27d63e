use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

use crate::error::Result;
use crate::inspect::offline_search;
use crate::inspect::verify_skip_graph;
use crate::skipgraph::MembershipVector;
use crate::skipgraph::RoutingTable;
use crate::skipgraph::SGNode;
use crate::tests::default::collect_tables;
use crate::tests::default::prepare_graph;
use crate::tests::default::prepare_scenario_b;

#[tokio::test]
async fn test_search_seven_members() -> Result<()> {
    let swarms = prepare_scenario_b().await;
    let cases = [
        (20, 13),
        (13, 13),
        (22, 21),
        (100, 99),
        (40, 36),
        (48, 48),
        (74, 48),
        // no key below 5, the smallest member answers
        (5, 13),
    ];
    for swarm in swarms.iter() {
        for (target, expected) in cases {
            let outcome = swarm.search(target).await?;
            assert_eq!(
                outcome.node.key,
                expected,
                "search {} from {}",
                target,
                swarm.my_node()?.key
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_search_records_stats() -> Result<()> {
    let swarms = prepare_scenario_b().await;
    let from = &swarms[0];
    let before = from.search_stats()?.count();

    let near = from.search(13).await?;
    assert_eq!(near.hops, 0);
    let far = from.search(99).await?;
    assert!(far.hops >= 1);

    let stats = from.search_stats()?;
    assert_eq!(stats.count(), before + 2);
    assert_eq!(stats.latencies.len() as u64, stats.count());
    assert!(stats.hops.contains_key(&0));
    assert!(stats.mean_hops().is_some());
    assert_eq!(from.pending_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_random_population_over_network() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(2023);
    let mut keys: Vec<u32> = (0..24).map(|i| i * 10 + 5).collect();
    keys.shuffle(&mut rng);
    let members: Vec<(u32, Vec<u8>)> = keys
        .iter()
        .map(|k| (*k, (0..6).map(|_| rng.gen_range(0..2)).collect()))
        .collect();

    let swarms = prepare_graph(&members).await;
    assert_eq!(verify_skip_graph(&collect_tables(&swarms)), vec![]);

    for _ in 0..40 {
        let from = &swarms[rng.gen_range(0..swarms.len())];
        let target = rng.gen_range(0..260);
        let expected = if target < 5 { 5 } else { (target - 5) / 10 * 10 + 5 };
        assert_eq!(from.search(target).await?.node.key, expected.min(235));
    }
    Ok(())
}

fn random_population(rng: &mut StdRng, n: u32) -> Vec<RoutingTable> {
    let nodes: Vec<SGNode> = (0..n)
        .map(|i| {
            let key = i * 10;
            SGNode::new(
                "dummy://offline",
                &key.to_be_bytes(),
                key,
                MembershipVector::random_with_rng(rng, 32),
            )
        })
        .collect();
    RoutingTable::build_population(&nodes).unwrap()
}

fn mean_hops(n: u32, searches: usize) -> f64 {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let tables = random_population(&mut rng, n);
    let mut total = 0u64;
    for _ in 0..searches {
        let from = rng.gen_range(0..n) * 10;
        let target = rng.gen_range(0..n * 10);
        let (found, hops) = offline_search(&tables, from, target).unwrap();
        assert_eq!(found, target / 10 * 10, "search {} from {}", target, from);
        total += hops as u64;
    }
    total as f64 / searches as f64
}

#[test]
fn test_hops_grow_logarithmically() {
    let mut means = vec![];
    for n in [10u32, 100, 1000] {
        let mean = mean_hops(n, 200);
        let ratio = mean / (n as f64).log2();
        assert!(
            (0.2..=2.5).contains(&ratio),
            "n = {}, mean hops {}, ratio {}",
            n,
            mean,
            ratio
        );
        means.push(mean);
    }
    assert!(means[2] > means[0], "{:?}", means);
}

#[test]
fn test_built_population_is_consistent() {
    let mut rng = StdRng::seed_from_u64(42);
    let tables = random_population(&mut rng, 200);
    assert_eq!(verify_skip_graph(&tables), vec![]);
    for table in tables.iter() {
        assert!(table.height() <= table.capacity());
    }
}
