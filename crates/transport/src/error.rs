#![allow(missing_docs)]

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Peer {0} not found")]
    PeerNotFound(String),

    #[error("Peer {0} has no callback installed")]
    CallbackNotSet(String),

    #[error("Transport {0} is closed")]
    TransportClosed(String),

    #[error("Transport sync lock error")]
    SyncLockError,
}
