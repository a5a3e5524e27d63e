#![warn(missing_docs)]
//! A skip graph member bound to a transport.

mod builder;
/// Callback installed on the transport
pub mod callback;
/// Framing of skip graph messages over the transport
pub mod transport;

use std::sync::Arc;

pub use builder::SwarmBuilder;
use rand::seq::SliceRandom;

use crate::error::Error;
use crate::error::Result;
use crate::inspect::SwarmInspect;
use crate::message::MessageHandler;
use crate::pending::RequestTables;
use crate::pending::SearchOutcome;
use crate::pending::SearchStats;
use crate::skipgraph::DiscoveryCache;
use crate::skipgraph::MembershipVector;
use crate::skipgraph::RoutingTable;
use crate::skipgraph::SGNode;
use crate::skipgraph::SkipGraph;
use crate::swarm::transport::SwarmTransport;

/// The local member of a skip graph, with its transport and pending requests.
pub struct Swarm {
    pub(crate) transport: Arc<SwarmTransport>,
    pub(crate) graph: Arc<SkipGraph>,
    discovery: Arc<DiscoveryCache>,
    requests: Arc<RequestTables>,
    pub(crate) message_handler: MessageHandler,
}

impl Swarm {
    /// Address of the member on its transport.
    pub fn address(&self) -> String {
        self.transport.address()
    }

    /// Reference of the local skip graph state.
    pub fn graph(&self) -> Arc<SkipGraph> {
        self.graph.clone()
    }

    /// Info learned from introductions.
    pub fn discovery(&self) -> Arc<DiscoveryCache> {
        self.discovery.clone()
    }

    /// Give the member its key and membership vector.
    /// A random vector is drawn when `mv` is `None`.
    pub fn initialize_routing_table(&self, key: u32, mv: Option<MembershipVector>) -> Result<()> {
        self.graph.initialize(key, mv)
    }

    /// The local member as seen by others.
    pub fn my_node(&self) -> Result<SGNode> {
        self.graph.my_node()
    }

    /// Run an introduction with `peer`, both sides learn each other's node info.
    pub async fn introduce(&self, peer: &str) -> Result<()> {
        self.transport.introduce(peer).await
    }

    /// Join the skip graph.
    ///
    /// With no introducer, a random known peer whose node info was learned
    /// through introduction is used. A member knowing no peer at all is the
    /// first member of the graph and has nothing to do.
    pub async fn join(&self, introducer: Option<&SGNode>) -> Result<()> {
        if !self.graph.is_initialized()? {
            return Err(Error::RoutingTableNotInitialized);
        }
        if let Some(introducer) = introducer {
            return self.message_handler.join(introducer).await;
        }
        let peers = self.transport.peers();
        if peers.is_empty() {
            tracing::info!(
                "Node {} knows no peer, starting a new skip graph",
                self.graph.short_id()
            );
            return Ok(());
        }
        let mut known = vec![];
        for peer in peers {
            if let Some(node) = self.discovery.lookup_peer_info(&peer)? {
                known.push(node);
            }
        }
        let introducer = known
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(Error::NoIntroducer)?;
        self.message_handler.join(&introducer).await
    }

    /// Leave the skip graph, returns whether every repair was confirmed.
    pub async fn leave(&self) -> Result<bool> {
        self.message_handler.leave().await
    }

    /// The member holding the greatest key not above `key`,
    /// or the smallest key when there is none.
    pub async fn search(&self, key: u32) -> Result<SearchOutcome> {
        self.message_handler.search(key).await
    }

    /// Hop histogram and latencies of the searches issued by this member.
    pub fn search_stats(&self) -> Result<SearchStats> {
        self.message_handler.search_stats()
    }

    /// A copy of the routing table, `None` before initialization or after leaving.
    pub fn routing_table(&self) -> Result<Option<RoutingTable>> {
        self.graph.snapshot()
    }

    /// Number of requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Check the status of swarm
    pub fn inspect(&self) -> Result<SwarmInspect> {
        SwarmInspect::inspect(self)
    }

    /// Cancel every pending request and close the transport.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!(
            "Node {} shutting down with {} pending requests",
            self.graph.short_id(),
            self.requests.len()
        );
        self.requests.clear();
        self.transport.close().await
    }
}
