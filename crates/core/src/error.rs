//! Error of skipnet_core

use crate::pending::RequestCategory;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in skipnet-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Routing table not initialized")]
    RoutingTableNotInitialized,

    #[error("Node with key {0} is already registered in the skip graph")]
    DuplicateKey(u32),

    #[error("Unable to join the skip graph, no introducer available")]
    NoIntroducer,

    #[error("Level {level} out of range, highest level is {max}")]
    LevelOutOfRange { level: usize, max: usize },

    #[error("Request {category}:{id} timed out")]
    RequestTimeout { category: RequestCategory, id: u32 },

    #[error("Request {category}:{id} cancelled before any response")]
    RequestCancelled { category: RequestCategory, id: u32 },

    #[error("Invalid membership vector: {0}")]
    InvalidMembershipVector(String),

    #[error("Skip graph lock poisoned")]
    SkipGraphSyncLockError,

    #[error("Discovery cache lock poisoned")]
    DiscoverySyncLockError,

    #[error("Search stats lock poisoned")]
    StatsSyncLockError,

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] skipnet_transport::error::Error),

    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String),

    #[error("Open file error: {0}")]
    OpenFileError(String),

    #[error("Create file error: {0}")]
    CreateFileError(String),

    #[error("Yaml encode or decode error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
