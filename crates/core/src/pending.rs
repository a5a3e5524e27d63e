//! Correlation of outgoing requests with their asynchronous responses.
//!
//! Every request registers an entry keyed by `(category, id)`, where `id` is a
//! random number unique among the live entries of that category. The id travels
//! with the request and comes back with the response. The first response (or the
//! deadline) consumes the entry; anything arriving later finds nothing and is
//! dropped, so a request resolves at most once.
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::error::Result;
use crate::skipgraph::SGNode;

/// Kind of a pending request. Ids are unique per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestCategory {
    /// Search for the closest key.
    Search,
    /// Ask a member for one of its neighbours.
    Neighbour,
    /// Ask a member to link with us.
    Link,
    /// Ask a chain of members for a level above.
    Buddy,
    /// Tell the right neighbour we leave.
    Delete,
    /// Walk left to replace a departing neighbour.
    FindNewNeighbour,
    /// Tell the left neighbour to clear its right slot.
    SetNeighbourNil,
}

impl fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestCategory::Search => "search",
            RequestCategory::Neighbour => "neighbour",
            RequestCategory::Link => "link",
            RequestCategory::Buddy => "buddy",
            RequestCategory::Delete => "delete",
            RequestCategory::FindNewNeighbour => "find-new-neighbour",
            RequestCategory::SetNeighbourNil => "set-neighbour-nil",
        };
        write!(f, "{}", s)
    }
}

type Key = (RequestCategory, u32);

/// A live entry of a [PendingTable].
pub struct PendingEntry<T> {
    tx: oneshot::Sender<T>,
    created_at: Instant,
    deadline: Option<Instant>,
}

impl<T> PendingEntry<T> {
    /// Time since the request was registered.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// When the request gives up, if ever.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Hand `value` to the waiter. Returns false if the waiter is gone.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Table of pending requests whose responses carry a `T`.
pub struct PendingTable<T> {
    entries: Arc<DashMap<Key, PendingEntry<T>>>,
    timeout: Option<Duration>,
}

/// The waiting half of a registered request.
pub struct PendingRequest<T> {
    /// Category of the request.
    pub category: RequestCategory,
    /// Id to embed in the outgoing message.
    pub id: u32,
    rx: oneshot::Receiver<T>,
    entries: Arc<DashMap<Key, PendingEntry<T>>>,
    timeout: Option<Duration>,
    settled: bool,
}

impl<T> PendingTable<T> {
    /// A table whose entries expire after `timeout`, or never if `None`.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Register a new request with a fresh random id.
    pub fn register(&self, category: RequestCategory) -> PendingRequest<T> {
        let (tx, rx) = oneshot::channel();
        let created_at = Instant::now();
        let deadline = self.timeout.map(|t| created_at + t);
        let mut entry = Some(PendingEntry {
            tx,
            created_at,
            deadline,
        });
        loop {
            let id = rand::random::<u32>();
            if let Entry::Vacant(e) = self.entries.entry((category, id)) {
                if let Some(entry) = entry.take() {
                    e.insert(entry);
                }
                return PendingRequest {
                    category,
                    id,
                    rx,
                    entries: self.entries.clone(),
                    timeout: self.timeout,
                    settled: false,
                };
            }
        }
    }

    /// Remove and return the entry, if it is still live.
    pub fn take(&self, category: RequestCategory, id: u32) -> Option<PendingEntry<T>> {
        self.entries.remove(&(category, id)).map(|(_, e)| e)
    }

    /// Resolve the entry with `value`.
    /// Returns false when there is no such live entry, the value is then dropped.
    pub fn resolve(&self, category: RequestCategory, id: u32, value: T) -> bool {
        match self.take(category, id) {
            Some(entry) => entry.resolve(value),
            None => {
                tracing::warn!("{} request with id {} not found", category, id);
                false
            }
        }
    }

    /// Whether the entry is still live.
    pub fn contains(&self, category: RequestCategory, id: u32) -> bool {
        self.entries.contains_key(&(category, id))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every live entry, their waiters observe [Error::RequestCancelled].
    pub fn clear(&self) {
        self.entries.clear()
    }
}

impl<T> PendingRequest<T> {
    /// Wait for the response.
    ///
    /// On deadline the entry is evicted and [Error::RequestTimeout] returned.
    pub async fn wait(mut self) -> Result<T> {
        let key = (self.category, self.id);
        let res = match self.timeout {
            Some(t) => match tokio::time::timeout(t, &mut self.rx).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!("{} request with id {} timed out", key.0, key.1);
                    return Err(Error::RequestTimeout {
                        category: key.0,
                        id: key.1,
                    });
                }
            },
            None => (&mut self.rx).await,
        };
        self.settled = true;
        res.map_err(|_| Error::RequestCancelled {
            category: key.0,
            id: key.1,
        })
    }

    /// Give up on the request without waiting, e.g. when it could not be sent.
    pub fn cancel(self) {
        drop(self)
    }
}

/// A request given up before its response, by timeout, cancel or drop,
/// leaves no entry behind.
impl<T> Drop for PendingRequest<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.entries.remove(&(self.category, self.id));
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The member holding the closest key.
    pub node: SGNode,
    /// Forwarding hops the search took.
    pub hops: u32,
}

/// Hop histogram and latencies of the searches issued by this member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of searches per hop count.
    pub hops: BTreeMap<u32, u64>,
    /// Latency of each search, in the order they completed.
    pub latencies: Vec<Duration>,
}

impl SearchStats {
    /// Record one completed search.
    pub fn record(&mut self, hops: u32, latency: Duration) {
        *self.hops.entry(hops).or_insert(0) += 1;
        self.latencies.push(latency);
    }

    /// Number of recorded searches.
    pub fn count(&self) -> u64 {
        self.hops.values().sum()
    }

    /// Mean hop count, `None` before the first search.
    pub fn mean_hops(&self) -> Option<f64> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        let total: u64 = self.hops.iter().map(|(h, n)| *h as u64 * n).sum();
        Some(total as f64 / count as f64)
    }
}

/// All pending request tables of a member.
pub struct RequestTables {
    /// Searches.
    pub search: PendingTable<SearchOutcome>,
    /// Neighbour, link, buddy and find-new-neighbour requests, resolved by an optional node.
    pub nodes: PendingTable<Option<SGNode>>,
    /// Delete and set-neighbour-nil requests, resolved by a confirmation flag.
    pub confirms: PendingTable<bool>,
}

impl RequestTables {
    /// Tables sharing the same deadline.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            search: PendingTable::new(timeout),
            nodes: PendingTable::new(timeout),
            confirms: PendingTable::new(timeout),
        }
    }

    /// Drop every live entry of every table.
    pub fn clear(&self) {
        self.search.clear();
        self.nodes.clear();
        self.confirms.clear();
    }

    /// Number of live entries across all tables.
    pub fn len(&self) -> usize {
        self.search.len() + self.nodes.len() + self.confirms.len()
    }

    /// Whether no entry is live in any table.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
