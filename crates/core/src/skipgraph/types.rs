//! Direction and the decisions returned by the routing table.
use serde::Deserialize;
use serde::Serialize;

use super::SGNode;

/// Which neighbour slot of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Smaller keys.
    Left,
    /// Larger keys.
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn both() -> [Side; 2] {
        [Side::Left, Side::Right]
    }
}

/// Outcome of one greedy search step on a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// The local member is the answer.
    Local,
    /// A neighbour is the answer without further routing.
    Found(SGNode),
    /// Continue the search on `next`, starting at `level`.
    Forward { next: SGNode, level: usize },
}

/// What to do with a link request for a new neighbour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// The current neighbour is closer, pass the request on to it.
    Forward(SGNode),
    /// Link with the new neighbour directly.
    Link,
}

/// What to do with a buddy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuddyAction {
    /// Bits match, link one level higher.
    Link(LinkAction),
    /// Bits differ, hand the request to this neighbour.
    Forward(SGNode),
    /// Bits differ and the chain ends here.
    Exhausted,
}
