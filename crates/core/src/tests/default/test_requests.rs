use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::error::Result;
use crate::message::ConfirmDelete;
use crate::message::Message;
use crate::message::SearchResponse;
use crate::pending::RequestCategory;
use crate::skipgraph::SGNode;
use crate::skipgraph::Side;
use crate::swarm::transport::DummyTransport;
use crate::swarm::Swarm;
use crate::swarm::SwarmBuilder;
use crate::tests::default::join_via;
use crate::tests::default::prepare_swarm;
use crate::tests::default::prepare_swarm_with_timeout;

fn uninitialized_swarm() -> Arc<Swarm> {
    SwarmBuilder::new(Arc::new(DummyTransport::new()))
        .membership_vector_length(2)
        .build()
        .unwrap()
}

fn node_at(swarm: &Swarm) -> SGNode {
    let mut node = SGNode::empty();
    node.address = swarm.address();
    node.public_key = b"unknown".to_vec();
    node
}

#[tokio::test]
async fn test_request_to_silent_member_times_out() -> Result<()> {
    let asking = prepare_swarm_with_timeout(1, &[0, 1], Duration::from_millis(200));
    let silent = uninitialized_swarm();

    let res = asking
        .message_handler
        .get_neighbour(&node_at(&silent), Side::Right, 0)
        .await;
    assert!(matches!(
        res,
        Err(Error::RequestTimeout {
            category: RequestCategory::Neighbour,
            ..
        })
    ));
    assert_eq!(asking.pending_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_responses_are_dropped() -> Result<()> {
    let a = prepare_swarm(1, &[0, 1]);
    let b = prepare_swarm(2, &[1, 1]);
    a.join(None).await?;
    join_via(&b, &a).await?;
    let before = b.search_stats()?.count();
    let table = b.routing_table()?;

    b.transport
        .send_message(
            Message::SearchResponse(SearchResponse {
                id: 12345,
                result: a.my_node()?.to_wire(),
                hops: 3,
            }),
            &b.address(),
        )
        .await?;
    a.transport
        .send_message(
            Message::ConfirmDelete(ConfirmDelete { id: 54321, level: 0 }),
            &b.address(),
        )
        .await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(b.search_stats()?.count(), before);
    assert_eq!(b.pending_requests(), 0);
    assert_eq!(
        b.routing_table()?.map(|t| t.to_string()),
        table.map(|t| t.to_string())
    );
    // still serving
    assert_eq!(b.search(1).await?.node.key, 1);
    Ok(())
}

#[tokio::test]
async fn test_shutdown_cancels_pending_requests() -> Result<()> {
    let asking = prepare_swarm_with_timeout(1, &[0, 1], Duration::from_secs(30));
    let silent = uninitialized_swarm();
    let target = node_at(&silent);

    let handle = {
        let asking = asking.clone();
        tokio::spawn(async move {
            asking
                .message_handler
                .get_neighbour(&target, Side::Left, 0)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(asking.pending_requests(), 1);

    asking.shutdown().await?;
    let res = handle.await.unwrap();
    assert!(matches!(
        res,
        Err(Error::RequestCancelled {
            category: RequestCategory::Neighbour,
            ..
        })
    ));
    assert_eq!(asking.pending_requests(), 0);

    // the transport is closed as well
    assert!(asking.search(1).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_operations_need_a_routing_table() -> Result<()> {
    let swarm = uninitialized_swarm();
    assert!(matches!(
        swarm.search(1).await,
        Err(Error::RoutingTableNotInitialized)
    ));
    assert!(matches!(
        swarm.leave().await,
        Err(Error::RoutingTableNotInitialized)
    ));
    assert!(matches!(
        swarm.join(None).await,
        Err(Error::RoutingTableNotInitialized)
    ));
    Ok(())
}

#[tokio::test]
async fn test_send_to_unknown_address_fails() -> Result<()> {
    let swarm = prepare_swarm(1, &[0, 0]);
    let mut ghost = SGNode::empty();
    ghost.address = "dummy://nowhere".to_string();
    ghost.public_key = b"ghost".to_vec();

    let res = swarm.join(Some(&ghost)).await;
    assert!(matches!(res, Err(Error::Transport(_))));
    assert_eq!(swarm.pending_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_inspect() -> Result<()> {
    let a = prepare_swarm(1, &[0, 1]);
    let b = prepare_swarm(2, &[0, 0]);
    a.join(None).await?;
    join_via(&b, &a).await?;

    let inspect = b.inspect()?;
    assert_eq!(inspect.address, b.address());
    assert_eq!(inspect.pending_requests, 0);
    assert_eq!(inspect.discovered_peers, 1);
    let table = inspect.routing_table.unwrap();
    assert_eq!(table.key, 2);
    assert_eq!(table.levels[0].left, Some(1));

    let json = serde_json::to_string(&a.inspect()?).unwrap();
    assert!(json.contains("\"key\":1"));
    Ok(())
}
