//! This module defines the [TransportInterface] and the message frame it carries.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::core::callback::BoxedTransportCallback;

/// The message frame exchanged between transports.
/// Frames are serialized by bincode before being put on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TransportMessage {
    /// Opaque application payload.
    Custom(Bytes),
}

/// A transport delivers [TransportMessage] to peers identified by address,
/// and introduces peers to each other.
#[async_trait]
pub trait TransportInterface {
    /// Error type of the transport.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The address other peers use to reach this transport.
    fn address(&self) -> String;

    /// Install the callback that receives messages and introductions.
    /// Replaces any callback installed before.
    fn set_callback(&self, callback: BoxedTransportCallback) -> Result<(), Self::Error>;

    /// Send a message to the peer at `peer`.
    /// The call returns once the message is handed over, not once it is handled.
    async fn send_message(&self, peer: &str, msg: TransportMessage) -> Result<(), Self::Error>;

    /// Run the introduction handshake with `peer`.
    /// Both sides attach their extra bytes and both learn each other.
    async fn introduce(&self, peer: &str) -> Result<(), Self::Error>;

    /// Addresses of the peers this transport has been introduced to.
    fn peers(&self) -> Vec<String>;

    /// Stop receiving messages and drop the installed callback.
    async fn close(&self) -> Result<(), Self::Error>;
}
