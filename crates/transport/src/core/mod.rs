//! The main concepts of this mod are:
//!
//! The [TransportInterface](transport::TransportInterface) trait defines how a peer
//! sends binary messages to other peers and how it gets introduced to them.
//! See the [transport] module.
//!
//! The [TransportCallback](callback::TransportCallback) trait is used to let user handle
//! the events of a transport, including incoming messages and finished introductions.
//! See the [callback] module.

pub mod callback;
pub mod transport;
