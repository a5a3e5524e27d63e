//! Constant variables.

/// Number of bits in a membership vector, the table holds one more level than this.
pub const DEFAULT_MEMBERSHIP_VECTOR_LENGTH: usize = 32;
/// Longest membership vector, its length travels as a `u16`.
pub const MAX_MEMBERSHIP_VECTOR_LENGTH: usize = u16::MAX as usize;
/// Deadline of every pending request in ms, `0` disables it.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10 * 1000;
/// Max number of peers remembered by the discovery cache.
pub const DEFAULT_DISCOVERY_CAPACITY: usize = 1024;
/// Hex chars of a public key shown in logs.
pub const SHORT_ID_LEN: usize = 8;
