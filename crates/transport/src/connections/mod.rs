//! Provide a `DummyTransport` for testing.
//! Network backed transports implement the same traits from [crate::core].

#[cfg(feature = "dummy")]
mod dummy;

#[cfg(feature = "dummy")]
pub use crate::connections::dummy::DummyTransport;
