//! Bounded cache of node info learned from introductions.
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;

use super::SGNode;
use crate::error::Error;
use crate::error::Result;

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, SGNode>,
    order: VecDeque<String>,
}

/// Last known [SGNode] of each transport peer.
/// When full, the peer recorded first is evicted first.
pub struct DiscoveryCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl DiscoveryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<Inner>> {
        self.inner.lock().map_err(|_| Error::DiscoverySyncLockError)
    }

    /// Remember `node` as the info of `peer`, replacing what was known before.
    pub fn record_peer_info(&self, peer: &str, node: SGNode) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.nodes.insert(peer.to_string(), node).is_none() {
            inner.order.push_back(peer.to_string());
        }
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.nodes.remove(&oldest);
                tracing::debug!("Discovery cache evicted {}", oldest);
            }
        }
        Ok(())
    }

    pub fn lookup_peer_info(&self, peer: &str) -> Result<Option<SGNode>> {
        Ok(self.lock()?.nodes.get(peer).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.nodes.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.nodes.is_empty())
    }
}
