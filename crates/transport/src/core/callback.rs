//! This module defines the [TransportCallback] trait.

use async_trait::async_trait;
use bytes::Bytes;

type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// The [BoxedTransportCallback] is a boxed [TransportCallback] trait object.
pub type BoxedTransportCallback = Box<dyn TransportCallback + Send + Sync>;

/// Any object that implements this trait can be used as a callback of a transport.
///
/// Messages may be delivered concurrently, so an implementation must not assume
/// that one `on_message` call finishes before the next one starts.
#[async_trait]
pub trait TransportCallback {
    /// This method is invoked when a custom message arrives from `peer`.
    async fn on_message(&self, _peer: &str, _msg: &Bytes) -> Result<(), CallbackError> {
        Ok(())
    }

    /// The extra bytes attached to introduction handshakes sent by this side.
    async fn introduction_extra_bytes(&self) -> Bytes {
        Bytes::new()
    }

    /// This method is invoked when `peer` introduced itself with `extra_bytes`.
    async fn on_introduction(&self, _peer: &str, _extra_bytes: &Bytes) -> Result<(), CallbackError> {
        Ok(())
    }
}
