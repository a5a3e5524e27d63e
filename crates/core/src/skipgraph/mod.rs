//! Skip graph data structures and the state of the local member.
//!
//! A skip graph keeps, for every level `l`, a sorted doubly linked list of the
//! members sharing an `l` bit prefix of their [MembershipVector]. Level 0 holds
//! every member. Searching greedily from the highest level down reaches any key
//! in an expected `O(log N)` hops.

mod discovery;
mod graph;
mod membership;
mod node;
mod routing_table;
mod types;

pub use discovery::DiscoveryCache;
pub use graph::SkipGraph;
pub use membership::MembershipVector;
pub(crate) use node::short_id;
pub use node::NodeInfo;
pub use node::SGNode;
pub use routing_table::Level;
pub use routing_table::RoutingTable;
pub use types::BuddyAction;
pub use types::LinkAction;
pub use types::SearchAction;
pub use types::Side;
