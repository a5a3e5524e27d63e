//! Identity of a skip graph member as seen by other members.
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

use super::MembershipVector;
use crate::consts::SHORT_ID_LEN;
use crate::error::Result;

/// A member of the skip graph: where to reach it, who it is, and where it sits in the order.
/// Never mutated after construction.
///
/// Equality and hashing only look at `key` and `public_key`.
#[derive(Clone)]
pub struct SGNode {
    pub address: String,
    pub public_key: Vec<u8>,
    pub key: u32,
    pub mv: MembershipVector,
}

/// Wire form of [SGNode].
/// There is no absent value on the wire, so "no such node" travels as [NodeInfo::empty].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub address: String,
    pub public_key: Vec<u8>,
    pub key: u32,
    pub mv: Vec<u8>,
}

impl SGNode {
    pub fn new(address: &str, public_key: &[u8], key: u32, mv: MembershipVector) -> Self {
        Self {
            address: address.to_string(),
            public_key: public_key.to_vec(),
            key,
            mv,
        }
    }

    /// The sentinel standing for "no such node".
    pub fn empty() -> Self {
        Self::new("", &[], 0, MembershipVector::default())
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.public_key.is_empty()
    }

    /// Last hex chars of the public key, used in logs.
    pub fn short_id(&self) -> String {
        short_id(&self.public_key)
    }

    pub fn to_wire(&self) -> NodeInfo {
        NodeInfo {
            address: self.address.clone(),
            public_key: self.public_key.clone(),
            key: self.key,
            mv: self.mv.to_bytes(),
        }
    }

    pub fn from_wire(info: &NodeInfo) -> Result<Self> {
        if info.is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self {
            address: info.address.clone(),
            public_key: info.public_key.clone(),
            key: info.key,
            mv: MembershipVector::from_bytes(&info.mv)?,
        })
    }
}

impl NodeInfo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.public_key.is_empty()
    }

    /// Encode an optional node, `None` becomes the empty sentinel.
    pub fn from_option(node: Option<&SGNode>) -> Self {
        node.map(SGNode::to_wire).unwrap_or_default()
    }

    /// Decode to an optional node, the empty sentinel becomes `None`.
    pub fn to_option(&self) -> Result<Option<SGNode>> {
        if self.is_empty() {
            return Ok(None);
        }
        SGNode::from_wire(self).map(Some)
    }
}

pub(crate) fn short_id(public_key: &[u8]) -> String {
    let h = hex::encode(public_key);
    let start = h.len().saturating_sub(SHORT_ID_LEN);
    h[start..].to_string()
}

impl PartialEq for SGNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.public_key == other.public_key
    }
}

impl Eq for SGNode {}

impl Hash for SGNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.public_key.hash(state);
    }
}

impl fmt::Display for SGNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<empty>");
        }
        write!(f, "{} (key: {}, mv: {})", self.short_id(), self.key, self.mv)
    }
}

impl fmt::Debug for SGNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SGNode")
            .field("address", &self.address)
            .field("public_key", &self.short_id())
            .field("key", &self.key)
            .field("mv", &self.mv)
            .finish()
    }
}
