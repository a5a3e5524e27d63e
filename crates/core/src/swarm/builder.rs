#![warn(missing_docs)]
//! This module provider [SwarmBuilder] and it's interface for
//! [Swarm]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::Config;
use crate::consts::DEFAULT_DISCOVERY_CAPACITY;
use crate::consts::DEFAULT_MEMBERSHIP_VECTOR_LENGTH;
use crate::consts::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::consts::MAX_MEMBERSHIP_VECTOR_LENGTH;
use crate::error::Error;
use crate::error::Result;
use crate::message::MessageHandler;
use crate::pending::RequestTables;
use crate::pending::SearchStats;
use crate::skipgraph::DiscoveryCache;
use crate::skipgraph::SkipGraph;
use crate::swarm::callback::InnerSwarmCallback;
use crate::swarm::transport::SharedTransport;
use crate::swarm::transport::SwarmTransport;
use crate::swarm::Swarm;

/// Creates a SwarmBuilder to configure a Swarm.
pub struct SwarmBuilder {
    transport: SharedTransport,
    public_key: Option<Vec<u8>>,
    mv_length: usize,
    request_timeout: Option<Duration>,
    discovery_capacity: usize,
}

impl SwarmBuilder {
    /// Creates new instance of [SwarmBuilder] over `transport`.
    pub fn new(transport: SharedTransport) -> Self {
        SwarmBuilder {
            transport,
            public_key: None,
            mv_length: DEFAULT_MEMBERSHIP_VECTOR_LENGTH,
            request_timeout: Some(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)),
            discovery_capacity: DEFAULT_DISCOVERY_CAPACITY,
        }
    }

    /// Creates a [SwarmBuilder] with the settings of `config`.
    pub fn from_config(transport: SharedTransport, config: &Config) -> Self {
        Self::new(transport)
            .membership_vector_length(config.membership_vector_length)
            .request_timeout(config.request_timeout())
            .discovery_capacity(config.discovery_cache_capacity)
    }

    /// Sets up the public key of the member, a random one is drawn otherwise.
    pub fn public_key(mut self, public_key: &[u8]) -> Self {
        self.public_key = Some(public_key.to_vec());
        self
    }

    /// Sets up the length of membership vectors, the same for every member of a graph.
    /// At most [MAX_MEMBERSHIP_VECTOR_LENGTH] bits.
    pub fn membership_vector_length(mut self, len: usize) -> Self {
        self.mv_length = len;
        self
    }

    /// Setup deadline of every request, `None` waits forever.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets up how many peers the discovery cache remembers.
    pub fn discovery_capacity(mut self, capacity: usize) -> Self {
        self.discovery_capacity = capacity;
        self
    }

    /// Try build for `Swarm`, installing its callback on the transport.
    pub fn build(self) -> Result<Arc<Swarm>> {
        if self.mv_length > MAX_MEMBERSHIP_VECTOR_LENGTH {
            return Err(Error::InvalidMembershipVector(format!(
                "length {} exceeds {}",
                self.mv_length, MAX_MEMBERSHIP_VECTOR_LENGTH
            )));
        }
        let public_key = self
            .public_key
            .unwrap_or_else(|| rand::random::<[u8; 32]>().to_vec());
        let transport = Arc::new(SwarmTransport::new(self.transport));
        let graph = Arc::new(SkipGraph::new(
            &transport.address(),
            &public_key,
            self.mv_length,
        ));
        let discovery = Arc::new(DiscoveryCache::new(self.discovery_capacity));
        let requests = Arc::new(RequestTables::new(self.request_timeout));
        let stats = Arc::new(Mutex::new(SearchStats::default()));

        let message_handler =
            MessageHandler::new(transport.clone(), graph.clone(), requests.clone(), stats);
        let callback =
            InnerSwarmCallback::new(message_handler.clone(), graph.clone(), discovery.clone());
        transport.set_callback(Box::new(callback))?;

        Ok(Arc::new(Swarm {
            transport,
            graph,
            discovery,
            requests,
            message_handler,
        }))
    }
}
