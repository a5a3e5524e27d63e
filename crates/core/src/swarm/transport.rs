//! Skip graph messages over a [TransportInterface].
use std::sync::Arc;

#[cfg(any(test, feature = "dummy"))]
pub use skipnet_transport::connections::DummyTransport;
use skipnet_transport::core::callback::BoxedTransportCallback;
use skipnet_transport::core::transport::TransportInterface;
use skipnet_transport::core::transport::TransportMessage;
use skipnet_transport::error::Error as TransportError;

use crate::error::Result;
use crate::message::Message;
use crate::message::MessagePayload;

/// A transport carrying [TransportError], shared by the swarm and its handlers.
pub type SharedTransport = Arc<dyn TransportInterface<Error = TransportError> + Send + Sync>;

/// Wraps a transport, framing [Message] into [MessagePayload] stamped with our address.
pub struct SwarmTransport {
    transport: SharedTransport,
}

impl SwarmTransport {
    /// Wrap `transport`.
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    /// A swarm transport over a fresh in-memory [DummyTransport].
    #[cfg(any(test, feature = "dummy"))]
    pub fn new_dummy() -> Self {
        Self::new(Arc::new(DummyTransport::new()))
    }

    /// Address of the underlying transport.
    pub fn address(&self) -> String {
        self.transport.address()
    }

    /// Install the callback receiving messages and introductions.
    pub fn set_callback(&self, callback: BoxedTransportCallback) -> Result<()> {
        Ok(self.transport.set_callback(callback)?)
    }

    /// Send `msg` to the member reachable at `peer`.
    pub async fn send_message(&self, msg: Message, peer: &str) -> Result<()> {
        let payload = MessagePayload::new(&self.address(), msg);
        tracing::trace!("Sending {} to {}", payload.data, peer);
        let data = payload.to_bincode()?;
        self.transport
            .send_message(peer, TransportMessage::Custom(data))
            .await?;
        Ok(())
    }

    /// Run an introduction handshake with `peer`.
    pub async fn introduce(&self, peer: &str) -> Result<()> {
        Ok(self.transport.introduce(peer).await?)
    }

    /// Addresses of the peers known to the transport.
    pub fn peers(&self) -> Vec<String> {
        self.transport.peers()
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<()> {
        Ok(self.transport.close().await?)
    }
}
