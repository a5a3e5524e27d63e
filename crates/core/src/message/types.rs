#![warn(missing_docs)]
//! This module defines the skip graph messages.
//! Every message carries the `id` of the pending request it belongs to.
//! Requests that are forwarded along the graph keep the id of the originator,
//! so the final answer goes straight back to the member waiting for it.

use serde::Deserialize;
use serde::Serialize;

use crate::skipgraph::NodeInfo;
use crate::skipgraph::Side;

/// Find the member with the greatest key not above `search_key`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Search {
    /// Request id at the originator.
    pub id: u32,
    /// Where the answer goes.
    pub originator: NodeInfo,
    /// The key looked for.
    pub search_key: u32,
    /// Highest level the receiver may route on.
    pub level: usize,
    /// Forwarding hops so far.
    pub hops: u32,
}

/// Answer of [Search], sent to the originator.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchResponse {
    /// Request id at the originator.
    pub id: u32,
    /// The member found.
    pub result: NodeInfo,
    /// Forwarding hops the search took.
    pub hops: u32,
}

/// Ask a member for its neighbour on `side` at `level`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NeighbourRequest {
    /// Request id at the sender.
    pub id: u32,
    /// Which slot.
    pub side: Side,
    /// Which level.
    pub level: usize,
}

/// Answer of [NeighbourRequest].
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NeighbourResponse {
    /// Request id at the sender.
    pub id: u32,
    /// False when the slot is empty.
    pub found: bool,
    /// The neighbour, or the empty node.
    pub neighbour: NodeInfo,
}

/// Ask the receiver to take `originator` as its neighbour on `side` at `level`.
/// May be forwarded to a neighbour closer to the originator.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GetLink {
    /// Request id at the originator.
    pub id: u32,
    /// The member to link with.
    pub originator: NodeInfo,
    /// Slot of the receiver the originator goes to.
    pub side: Side,
    /// Which level.
    pub level: usize,
}

/// Final answer of [GetLink] and [Buddy]: the member that linked with the originator.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SetLink {
    /// Request id at the originator.
    pub id: u32,
    /// The new neighbour, or the empty node when a buddy chain ran out.
    pub new_neighbour: NodeInfo,
    /// Level of the new link.
    pub level: usize,
}

/// Join time request looking for a neighbour one level above `level`.
/// Travels away from the originator until a member with the same bit at `level` is met.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Buddy {
    /// Request id at the originator.
    pub id: u32,
    /// The joining member.
    pub originator: NodeInfo,
    /// Level the chain walks on.
    pub level: usize,
    /// Bit of the originator's membership vector at `level`.
    pub bit: u8,
    /// Slot of the matching member the originator goes to.
    pub side: Side,
}

/// The originator leaves, the receiver is its right neighbour at `level`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Delete {
    /// Request id at the originator.
    pub id: u32,
    /// The leaving member.
    pub originator: NodeInfo,
    /// Which level.
    pub level: usize,
}

/// Answer of [Delete] when the right side ran out of members.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NoNeighbour {
    /// Request id at the originator.
    pub id: u32,
    /// Which level.
    pub level: usize,
}

/// Walk left looking for a member that is not leaving.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FindNewNeighbour {
    /// Request id at the originator.
    pub id: u32,
    /// The member that lost its left neighbour.
    pub originator: NodeInfo,
    /// Which level.
    pub level: usize,
}

/// Answer of [FindNewNeighbour].
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FoundNewNeighbour {
    /// Request id at the originator.
    pub id: u32,
    /// The new left neighbour, or the empty node.
    pub neighbour: NodeInfo,
    /// Which level.
    pub level: usize,
}

/// Answer of [Delete] and [SetNeighbourNil].
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfirmDelete {
    /// Request id at the originator.
    pub id: u32,
    /// Which level.
    pub level: usize,
}

/// The originator leaves, the receiver should clear its right slot at `level`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SetNeighbourNil {
    /// Request id at the originator.
    pub id: u32,
    /// The leaving member.
    pub originator: NodeInfo,
    /// Which level.
    pub level: usize,
}

/// A collection MessageType use for unified management.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[non_exhaustive]
pub enum Message {
    /// Search for a key.
    Search(Search),
    /// Response of Search
    SearchResponse(SearchResponse),
    /// Query a neighbour.
    NeighbourRequest(NeighbourRequest),
    /// Response of NeighbourRequest
    NeighbourResponse(NeighbourResponse),
    /// Link request.
    GetLink(GetLink),
    /// Response of GetLink and Buddy
    SetLink(SetLink),
    /// Buddy request.
    Buddy(Buddy),
    /// Leave notice to the right neighbour.
    Delete(Delete),
    /// Response of Delete when nobody is left on the right.
    NoNeighbour(NoNeighbour),
    /// Walk left for a replacement neighbour.
    FindNewNeighbour(FindNewNeighbour),
    /// Response of FindNewNeighbour
    FoundNewNeighbour(FoundNewNeighbour),
    /// Response of Delete and SetNeighbourNil
    ConfirmDelete(ConfirmDelete),
    /// Leave notice to the left neighbour.
    SetNeighbourNil(SetNeighbourNil),
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
