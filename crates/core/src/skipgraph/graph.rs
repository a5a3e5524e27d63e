//! State of the local skip graph member.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::MutexGuard;

use super::short_id;
use super::MembershipVector;
use super::RoutingTable;
use super::SGNode;
use super::Side;
use crate::consts::MAX_MEMBERSHIP_VECTOR_LENGTH;
use crate::error::Error;
use crate::error::Result;

/// SkipGraph holds the identity and the [RoutingTable] of the local member.
///
/// Handlers run concurrently, so the table lives behind a lock. The lock is
/// only taken for synchronous decisions and never held across an await, so
/// each decision and the slot update it implies happen as one step.
pub struct SkipGraph {
    /// Address other members use to reach us.
    pub address: String,
    /// Public key of the local member.
    pub public_key: Vec<u8>,
    mv_length: usize,
    table: Mutex<Option<RoutingTable>>,
    /// Last table held before leaving, kept to pass on repair requests.
    departed: Mutex<Option<RoutingTable>>,
    leaving: AtomicBool,
}

impl SkipGraph {
    pub fn new(address: &str, public_key: &[u8], mv_length: usize) -> Self {
        Self {
            address: address.to_string(),
            public_key: public_key.to_vec(),
            mv_length,
            table: Mutex::new(None),
            departed: Mutex::new(None),
            leaving: AtomicBool::new(false),
        }
    }

    /// Length of the membership vectors, the table holds up to one level more.
    pub fn mv_length(&self) -> usize {
        self.mv_length
    }

    pub fn short_id(&self) -> String {
        short_id(&self.public_key)
    }

    pub fn lock_table(&self) -> Result<MutexGuard<Option<RoutingTable>>> {
        self.table.lock().map_err(|_| Error::SkipGraphSyncLockError)
    }

    fn lock_departed(&self) -> Result<MutexGuard<Option<RoutingTable>>> {
        self.departed
            .lock()
            .map_err(|_| Error::SkipGraphSyncLockError)
    }

    /// Run `f` on the routing table, failing if it is not initialized.
    pub fn with_table<R, F>(&self, f: F) -> Result<R>
    where F: FnOnce(&mut RoutingTable) -> Result<R> {
        let mut guard = self.lock_table()?;
        let table = guard.as_mut().ok_or(Error::RoutingTableNotInitialized)?;
        f(table)
    }

    /// Create a fresh routing table, replacing any previous one.
    /// A random membership vector is drawn when `mv` is `None`.
    pub fn initialize(&self, key: u32, mv: Option<MembershipVector>) -> Result<()> {
        if self.mv_length > MAX_MEMBERSHIP_VECTOR_LENGTH {
            return Err(Error::InvalidMembershipVector(format!(
                "length {} exceeds {}",
                self.mv_length, MAX_MEMBERSHIP_VECTOR_LENGTH
            )));
        }
        let mv = mv.unwrap_or_else(|| MembershipVector::random(self.mv_length));
        if mv.len() != self.mv_length {
            return Err(Error::InvalidMembershipVector(format!(
                "expect {} bits, got {}",
                self.mv_length,
                mv.len()
            )));
        }
        tracing::info!(
            "Node {} initializing routing table with key {} and MV {}",
            self.short_id(),
            key,
            mv
        );
        let mut table = self.lock_table()?;
        *table = Some(RoutingTable::new(key, mv));
        *self.lock_departed()? = None;
        Ok(())
    }

    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.lock_table()?.is_some())
    }

    pub fn my_node(&self) -> Result<SGNode> {
        self.with_table(|t| {
            Ok(SGNode::new(
                &self.address,
                &self.public_key,
                t.key(),
                t.mv().clone(),
            ))
        })
    }

    pub fn get(&self, level: usize, side: Side) -> Result<Option<SGNode>> {
        self.with_table(|t| Ok(t.get(level, side).cloned()))
    }

    pub fn set(&self, level: usize, side: Side, node: Option<SGNode>) -> Result<()> {
        self.with_table(|t| t.set(level, side, node))
    }

    pub fn height(&self) -> Result<usize> {
        self.with_table(|t| Ok(t.height()))
    }

    pub fn is_leaving(&self) -> bool {
        self.leaving.load(Ordering::SeqCst)
    }

    pub fn set_leaving(&self, leaving: bool) {
        self.leaving.store(leaving, Ordering::SeqCst)
    }

    /// Drop the routing table, the member is no longer part of the graph.
    ///
    /// The dropped table is remembered until the next [SkipGraph::initialize],
    /// see [SkipGraph::last_known].
    pub fn discard(&self) -> Result<Option<RoutingTable>> {
        let mut guard = self.lock_table()?;
        let table = guard.take();
        *self.lock_departed()? = table.clone();
        drop(guard);
        self.set_leaving(false);
        Ok(table)
    }

    /// Whether the member left the graph and was not initialized since.
    pub fn has_departed(&self) -> Result<bool> {
        Ok(self.lock_departed()?.is_some())
    }

    /// Neighbour on `side` at `level` in the live table, or in the last
    /// table held before leaving.
    pub fn last_known(&self, level: usize, side: Side) -> Result<Option<SGNode>> {
        let table = self.lock_table()?;
        if let Some(t) = table.as_ref() {
            return Ok(t.get(level, side).cloned());
        }
        Ok(self
            .lock_departed()?
            .as_ref()
            .and_then(|t| t.get(level, side).cloned()))
    }

    /// A copy of the current routing table.
    pub fn snapshot(&self) -> Result<Option<RoutingTable>> {
        Ok(self.lock_table()?.clone())
    }
}
