//! This module contains the [InnerTransportCallback] struct.

use bytes::Bytes;

use crate::core::callback::BoxedTransportCallback;
use crate::core::transport::TransportMessage;

/// [InnerTransportCallback] wraps the [BoxedTransportCallback] with inner handling
/// of raw frames received by a transport.
pub struct InnerTransportCallback {
    /// The address of the transport to which the current callback is assigned.
    pub address: String,
    callback: BoxedTransportCallback,
}

impl InnerTransportCallback {
    /// Create a new [InnerTransportCallback].
    pub fn new(address: &str, callback: BoxedTransportCallback) -> Self {
        Self {
            address: address.to_string(),
            callback,
        }
    }

    /// This method is invoked on a binary frame arrival from `peer`.
    pub async fn on_message(&self, peer: &str, msg: &Bytes) {
        match bincode::deserialize(msg) {
            Ok(m) => self.handle_message(peer, &m).await,
            Err(e) => {
                tracing::error!("Deserialize TransportMessage failed: {e:?}");
            }
        };
    }

    /// Extra bytes this side attaches to an introduction.
    pub async fn introduction_extra_bytes(&self) -> Bytes {
        self.callback.introduction_extra_bytes().await
    }

    /// This method is invoked when `peer` finished an introduction with us.
    pub async fn on_introduction(&self, peer: &str, extra_bytes: &Bytes) {
        if let Err(e) = self.callback.on_introduction(peer, extra_bytes).await {
            tracing::error!("Callback on_introduction failed: {e:?}");
        }
    }

    async fn handle_message(&self, peer: &str, msg: &TransportMessage) {
        match msg {
            TransportMessage::Custom(bytes) => {
                if let Err(e) = self.callback.on_message(peer, bytes).await {
                    tracing::error!("Callback on_message failed: {e:?}")
                }
            }
        }
    }
}
