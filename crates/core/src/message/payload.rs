#![warn(missing_docs)]

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use super::Message;
use crate::error::Result;

/// `MessagePayload` is used to transmit data between members.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessagePayload {
    /// Address of the member that sent this hop.
    pub sender: String,
    /// The message.
    pub data: Message,
}

impl MessagePayload {
    /// Wrap a message sent from `sender`.
    pub fn new(sender: &str, data: Message) -> Self {
        Self {
            sender: sender.to_string(),
            data,
        }
    }

    /// Deserialize from bincode bytes.
    pub fn from_bincode(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }

    /// Serialize to bincode bytes.
    pub fn to_bincode(&self) -> Result<Bytes> {
        Ok(bincode::serialize(self).map(Bytes::from)?)
    }
}
