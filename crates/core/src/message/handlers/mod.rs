#![warn(missing_docs)]
//! This module implemented message handler of the skip graph.
//!
//! Each handler reads and updates the local [SkipGraph] in one locked step and
//! only then sends messages, so the table lock is never held across an await.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use super::Message;
use super::MessagePayload;
use crate::error::Error;
use crate::error::Result;
use crate::pending::RequestCategory;
use crate::pending::RequestTables;
use crate::pending::SearchStats;
use crate::skipgraph::SGNode;
use crate::skipgraph::SkipGraph;
use crate::swarm::transport::SwarmTransport;

/// Operator and Handler for Join
pub mod join;
/// Operator and Handler for Leave
pub mod leave;
/// Operator and Handler for Search
pub mod search;

/// MessageHandler will manage resources.
#[derive(Clone)]
pub struct MessageHandler {
    transport: Arc<SwarmTransport>,
    graph: Arc<SkipGraph>,
    requests: Arc<RequestTables>,
    stats: Arc<Mutex<SearchStats>>,
}

/// Generic trait for handle message ,inspired by Actor-Model.
#[async_trait]
pub trait HandleMsg<T> {
    /// Message handler.
    async fn handle(&self, ctx: &MessagePayload, msg: &T) -> Result<()>;
}

impl MessageHandler {
    /// Create a new MessageHandler instance.
    pub fn new(
        transport: Arc<SwarmTransport>,
        graph: Arc<SkipGraph>,
        requests: Arc<RequestTables>,
        stats: Arc<Mutex<SearchStats>>,
    ) -> Self {
        Self {
            transport,
            graph,
            requests,
            stats,
        }
    }

    /// Requests arriving before the routing table exists are dropped.
    fn accepts(&self, name: &str) -> Result<bool> {
        if self.graph.is_initialized()? {
            return Ok(true);
        }
        tracing::warn!(
            "Node {} dropped {} request, routing table not initialized",
            self.graph.short_id(),
            name
        );
        Ok(false)
    }

    fn my_node(&self) -> Result<SGNode> {
        self.graph.my_node()
    }

    /// Send a request expecting a node back, and wait for it.
    async fn request_node<F>(
        &self,
        category: RequestCategory,
        peer: &SGNode,
        build: F,
    ) -> Result<Option<SGNode>>
    where
        F: FnOnce(u32) -> Message + Send,
    {
        let req = self.requests.nodes.register(category);
        if let Err(e) = self.transport.send_message(build(req.id), &peer.address).await {
            req.cancel();
            return Err(e);
        }
        req.wait().await
    }

    /// Send a request expecting a confirmation back, and wait for it.
    async fn request_confirm<F>(
        &self,
        category: RequestCategory,
        peer: &SGNode,
        build: F,
    ) -> Result<bool>
    where
        F: FnOnce(u32) -> Message + Send,
    {
        let req = self.requests.confirms.register(category);
        if let Err(e) = self.transport.send_message(build(req.id), &peer.address).await {
            req.cancel();
            return Err(e);
        }
        req.wait().await
    }

    /// A copy of the search statistics recorded so far.
    pub fn search_stats(&self) -> Result<SearchStats> {
        self.stats
            .lock()
            .map(|s| s.clone())
            .map_err(|_| Error::StatsSyncLockError)
    }
}
