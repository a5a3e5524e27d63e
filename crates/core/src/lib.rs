//! Skipnet: a Skip Graph overlay over pluggable transports.
//! --------------
//! - [SkipGraph](crate::skipgraph::SkipGraph) holds the routing table of the local member, built from
//!   its integer key and its random [MembershipVector](crate::skipgraph::MembershipVector).
//! - [Swarm](crate::swarm::Swarm) binds a member to a transport and runs the join, search and leave protocols.
//! - [Pending requests](crate::pending) correlate every outgoing request with its asynchronous response.
//! - Transports come from `skipnet-transport`, which ships an in-memory transport behind the `dummy` feature.
//!
//! # Routing
//!
//! Every member keeps a left and a right neighbour per level. Level 0 links all members in key order.
//! Level `l + 1` links the members sharing the first `l + 1` bits of their membership vector.
//!
//! A search for key `K` moves greedily: on the highest level whose neighbour does not overshoot `K`
//! it jumps to that neighbour and keeps searching from the same level. It ends on the member with the
//! greatest key not above `K`, or on the smallest member when every key is above `K`.
//! With independent random membership vectors a search takes `O(log N)` hops.
//!
//! # Join
//!
//! 1. Introduction
//! - Two transports introduce each other. Each side attaches its node info to the handshake, and
//!   the other side records it in its [DiscoveryCache](crate::skipgraph::DiscoveryCache).
//! 2. Level 0
//! - The new member searches its own key through an introducer and links between the member found
//!   and that member's right neighbour.
//! 3. Higher levels
//! - For each level, the new member asks its neighbours on both sides to walk away from it until a
//!   member with the same next membership vector bit is found. That member links it one level up.
//!
//! # Leave
//!
//! From the top level down, a leaving member asks its right neighbour to find a new left neighbour
//! among the members that stay, or tells its left neighbour to forget it.
//!
//! # Example
//! ```ignore
//! let swarm = SwarmBuilder::new(Arc::new(DummyTransport::new())).build()?;
//! swarm.initialize_routing_table(42, None)?;
//! swarm.join(None).await?;
//! let found = swarm.search(40).await?;
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod message;
pub mod pending;
pub mod skipgraph;
pub mod swarm;
#[cfg(test)]
mod tests;
