use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use lazy_static::lazy_static;
use rand::distributions::Distribution;

use crate::callback::InnerTransportCallback;
use crate::core::callback::BoxedTransportCallback;
use crate::core::transport::TransportInterface;
use crate::core::transport::TransportMessage;
use crate::error::Error;
use crate::error::Result;

lazy_static! {
    static ref ENDPOINTS: DashMap<String, Arc<DummyEndpoint>> = DashMap::new();
}

/// The receiving side of a [DummyTransport], shared through the process wide registry.
#[derive(Default)]
struct DummyEndpoint {
    callback: RwLock<Option<Arc<InnerTransportCallback>>>,
    peers: DashMap<String, ()>,
}

/// A dummy transport for local testing.
/// Implements the [TransportInterface] trait with no real network:
/// every transport registers itself under a random `dummy://` address and
/// every delivery runs on its own tokio task.
pub struct DummyTransport {
    address: String,
    endpoint: Arc<DummyEndpoint>,
    delay: Option<(u64, u64)>,
}

impl DummyEndpoint {
    fn callback(&self) -> Result<Option<Arc<InnerTransportCallback>>> {
        self.callback
            .read()
            .map(|cb| cb.clone())
            .map_err(|_| Error::SyncLockError)
    }
}

impl DummyTransport {
    /// Create a new [DummyTransport] and register it under a fresh address.
    pub fn new() -> Self {
        let endpoint = Arc::new(DummyEndpoint::default());
        loop {
            let address = format!("dummy://{}", random(0, 10000000000));
            if let dashmap::mapref::entry::Entry::Vacant(e) = ENDPOINTS.entry(address.clone()) {
                e.insert(endpoint.clone());
                return Self {
                    address,
                    endpoint,
                    delay: None,
                };
            }
        }
    }

    /// Delay every message sent by this transport by a random duration
    /// between `min_ms` and `max_ms` milliseconds.
    pub fn with_random_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        if min_ms < max_ms {
            self.delay = Some((min_ms, max_ms));
        }
        self
    }

    fn remote(peer: &str) -> Result<Arc<DummyEndpoint>> {
        ENDPOINTS
            .get(peer)
            .map(|e| e.value().clone())
            .ok_or_else(|| Error::PeerNotFound(peer.to_string()))
    }

    fn remote_callback(peer: &str) -> Result<(Arc<DummyEndpoint>, Arc<InnerTransportCallback>)> {
        let remote = Self::remote(peer)?;
        let callback = remote
            .callback()?
            .ok_or_else(|| Error::CallbackNotSet(peer.to_string()))?;
        Ok((remote, callback))
    }
}

impl Default for DummyTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportInterface for DummyTransport {
    type Error = Error;

    fn address(&self) -> String {
        self.address.clone()
    }

    fn set_callback(&self, callback: BoxedTransportCallback) -> Result<()> {
        let mut inner = self
            .endpoint
            .callback
            .write()
            .map_err(|_| Error::SyncLockError)?;
        *inner = Some(Arc::new(InnerTransportCallback::new(
            &self.address,
            callback,
        )));
        Ok(())
    }

    async fn send_message(&self, peer: &str, msg: TransportMessage) -> Result<()> {
        if !ENDPOINTS.contains_key(&self.address) {
            return Err(Error::TransportClosed(self.address.clone()));
        }
        let (_, callback) = Self::remote_callback(peer)?;
        let data = bincode::serialize(&msg).map(Bytes::from)?;
        let from = self.address.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            if let Some((min, max)) = delay {
                random_delay(min, max).await;
            }
            callback.on_message(&from, &data).await;
        });
        Ok(())
    }

    async fn introduce(&self, peer: &str) -> Result<()> {
        if peer == self.address {
            return Ok(());
        }
        let local_callback = self
            .endpoint
            .callback()?
            .ok_or_else(|| Error::CallbackNotSet(self.address.clone()))?;
        let (remote, remote_callback) = Self::remote_callback(peer)?;

        let local_extra = local_callback.introduction_extra_bytes().await;
        let remote_extra = remote_callback.introduction_extra_bytes().await;

        self.endpoint.peers.insert(peer.to_string(), ());
        remote.peers.insert(self.address.clone(), ());

        remote_callback
            .on_introduction(&self.address, &local_extra)
            .await;
        local_callback.on_introduction(peer, &remote_extra).await;
        tracing::debug!("{} introduced to {}", self.address, peer);
        Ok(())
    }

    fn peers(&self) -> Vec<String> {
        self.endpoint.peers.iter().map(|e| e.key().clone()).collect()
    }

    async fn close(&self) -> Result<()> {
        ENDPOINTS.remove(&self.address);
        self.endpoint.peers.clear();
        let mut inner = self
            .endpoint
            .callback
            .write()
            .map_err(|_| Error::SyncLockError)?;
        *inner = None;
        Ok(())
    }
}

async fn random_delay(low: u64, high: u64) {
    tokio::time::sleep(Duration::from_millis(random(low, high))).await;
}

fn random(low: u64, high: u64) -> u64 {
    let range = rand::distributions::Uniform::new(low, high);
    let mut rng = rand::thread_rng();
    range.sample(&mut rng)
}
