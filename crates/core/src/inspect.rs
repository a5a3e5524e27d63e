//! Snapshots of a member for debugging, and offline checks over a whole population.
use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::skipgraph::RoutingTable;
use crate::skipgraph::SearchAction;
use crate::skipgraph::Side;
use crate::swarm::Swarm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmInspect {
    pub address: String,
    pub public_key: String,
    pub pending_requests: usize,
    pub discovered_peers: usize,
    #[serde(default)]
    pub routing_table: Option<RoutingTableInspect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTableInspect {
    pub key: u32,
    pub mv: String,
    pub max_level: usize,
    pub levels: Vec<LevelInspect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInspect {
    pub level: usize,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl SwarmInspect {
    pub fn inspect(swarm: &Swarm) -> Result<Self> {
        let graph = swarm.graph();
        Ok(Self {
            address: swarm.address(),
            public_key: hex::encode(&graph.public_key),
            pending_requests: swarm.pending_requests(),
            discovered_peers: swarm.discovery().len()?,
            routing_table: graph.snapshot()?.as_ref().map(RoutingTableInspect::inspect),
        })
    }
}

impl RoutingTableInspect {
    pub fn inspect(table: &RoutingTable) -> Self {
        let levels = table
            .levels()
            .iter()
            .enumerate()
            .map(|(level, l)| LevelInspect {
                level,
                left: l.left.as_ref().map(|n| n.key),
                right: l.right.as_ref().map(|n| n.key),
            })
            .collect();
        Self {
            key: table.key(),
            mv: table.mv().to_string(),
            max_level: table.max_level(),
            levels,
        }
    }
}

/// A broken skip graph property found by [verify_skip_graph].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityViolation {
    /// A left neighbour with a greater key, or a right neighbour with a smaller one.
    Unordered {
        key: u32,
        level: usize,
        side: Side,
        neighbour: u32,
    },
    /// The neighbour does not point back.
    Asymmetric {
        key: u32,
        level: usize,
        side: Side,
        neighbour: u32,
    },
    /// Linked at `level` without sharing a prefix of that length.
    PrefixMismatch {
        key: u32,
        level: usize,
        neighbour: u32,
    },
    /// The neighbour is not part of the population.
    UnknownNeighbour {
        key: u32,
        level: usize,
        neighbour: u32,
    },
    /// Level 0 skips a member or stops early.
    Level0Gap {
        key: u32,
        expected: Option<u32>,
        found: Option<u32>,
    },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Check ordering, symmetry and prefixes of every link across `tables`.
/// Meant for tests and audits, nothing runs it on a live member.
pub fn verify_skip_graph(tables: &[RoutingTable]) -> Vec<IntegrityViolation> {
    let by_key: HashMap<u32, &RoutingTable> = tables.iter().map(|t| (t.key(), t)).collect();
    let mut violations = vec![];

    for table in tables {
        let key = table.key();
        for (level, _) in table.levels().iter().enumerate() {
            for side in Side::both() {
                let Some(n) = table.get(level, side) else {
                    continue;
                };
                let ordered = match side {
                    Side::Left => n.key < key,
                    Side::Right => n.key > key,
                };
                if !ordered {
                    violations.push(IntegrityViolation::Unordered {
                        key,
                        level,
                        side,
                        neighbour: n.key,
                    });
                }
                if table.mv().common_prefix_length(&n.mv) < level {
                    violations.push(IntegrityViolation::PrefixMismatch {
                        key,
                        level,
                        neighbour: n.key,
                    });
                }
                match by_key.get(&n.key) {
                    None => violations.push(IntegrityViolation::UnknownNeighbour {
                        key,
                        level,
                        neighbour: n.key,
                    }),
                    Some(other) => {
                        if other.get(level, side.opposite()).map(|m| m.key) != Some(key) {
                            violations.push(IntegrityViolation::Asymmetric {
                                key,
                                level,
                                side,
                                neighbour: n.key,
                            });
                        }
                    }
                }
            }
        }
    }

    let mut keys: Vec<u32> = by_key.keys().copied().collect();
    keys.sort_unstable();
    for (i, key) in keys.iter().enumerate() {
        let expected = keys.get(i + 1).copied();
        let found = by_key
            .get(key)
            .and_then(|t| t.get(0, Side::Right))
            .map(|n| n.key);
        if expected != found {
            violations.push(IntegrityViolation::Level0Gap {
                key: *key,
                expected,
                found,
            });
        }
    }
    violations
}

/// Run a search over `tables` without any message exchange.
/// Returns the key found and the hops taken, or `None` if a table is missing
/// or the search does not settle.
pub fn offline_search(tables: &[RoutingTable], from: u32, target: u32) -> Option<(u32, u32)> {
    let by_key: HashMap<u32, &RoutingTable> = tables.iter().map(|t| (t.key(), t)).collect();
    let mut current = *by_key.get(&from)?;
    let mut level = current.height();
    let mut hops = 0;

    while hops as usize <= tables.len() {
        match current.search_step(target, level) {
            SearchAction::Local => return Some((current.key(), hops)),
            SearchAction::Found(n) => return Some((n.key, hops)),
            SearchAction::Forward { next, level: l } => {
                current = by_key.get(&next.key)?;
                level = l;
                hops += 1;
            }
        }
    }
    None
}
