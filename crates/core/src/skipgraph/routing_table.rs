//! Per member table of left and right neighbours at each level.
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use super::BuddyAction;
use super::LinkAction;
use super::MembershipVector;
use super::SGNode;
use super::SearchAction;
use super::Side;
use crate::error::Error;
use crate::error::Result;

/// Neighbours of a single level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level {
    pub left: Option<SGNode>,
    pub right: Option<SGNode>,
}

impl Level {
    pub fn get(&self, side: Side) -> Option<&SGNode> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<SGNode> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// The routing table of one member, owned exclusively by it.
///
/// Levels are created on demand, up to one more than the membership vector length.
/// Once a join or leave has completed:
/// * at level 0, `left.key < key < right.key` for every present neighbour;
/// * a neighbour at level `l` shares a membership vector prefix of length `l` with us;
/// * if our right neighbour at level `l` is B, B's left neighbour at level `l` is us.
///
/// None of these is checked here, see [crate::inspect::verify_skip_graph].
#[derive(Debug, Clone)]
pub struct RoutingTable {
    key: u32,
    mv: MembershipVector,
    max_level: usize,
    levels: Vec<Level>,
}

impl RoutingTable {
    pub fn new(key: u32, mv: MembershipVector) -> Self {
        Self {
            key,
            mv,
            max_level: 0,
            levels: vec![],
        }
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn mv(&self) -> &MembershipVector {
        &self.mv
    }

    /// Highest level linked by the last completed join.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn set_max_level(&mut self, level: usize) {
        self.max_level = level;
    }

    /// Number of initialized levels.
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Number of levels the table may grow to.
    pub fn capacity(&self) -> usize {
        self.mv.len() + 1
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn get(&self, level: usize, side: Side) -> Option<&SGNode> {
        self.levels.get(level).and_then(|l| l.get(side))
    }

    /// Set or clear a slot, creating the missing levels below it.
    pub fn set(&mut self, level: usize, side: Side, node: Option<SGNode>) -> Result<()> {
        self.grow(level)?;
        *self.levels[level].slot_mut(side) = node;
        Ok(())
    }

    fn grow(&mut self, level: usize) -> Result<()> {
        if level >= self.capacity() {
            return Err(Error::LevelOutOfRange {
                level,
                max: self.capacity() - 1,
            });
        }
        if level >= self.levels.len() {
            self.levels.resize_with(level + 1, Level::default);
        }
        Ok(())
    }

    /// Clear every slot holding `key`, returns how many were cleared.
    pub fn remove_node(&mut self, key: u32) -> usize {
        let mut removed = 0;
        for level in self.levels.iter_mut() {
            for side in Side::both() {
                let slot = level.slot_mut(side);
                if slot.as_ref().map(|n| n.key) == Some(key) {
                    *slot = None;
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Count of present neighbours at each level, 0 to 2.
    pub fn size_per_level(&self) -> Vec<usize> {
        self.levels
            .iter()
            .map(|l| l.left.is_some() as usize + l.right.is_some() as usize)
            .collect()
    }

    /// Number of distinct neighbours across all levels, not counting ourselves.
    pub fn num_unique_nodes(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|l| [l.left.as_ref(), l.right.as_ref()])
            .flatten()
            .filter(|n| n.key != self.key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// One greedy step of a search for `target` that reached this member at `level`.
    pub fn search_step(&self, target: u32, level: usize) -> SearchAction {
        if self.key == target || self.levels.is_empty() {
            return self.exhausted(target);
        }
        let top = level.min(self.height() - 1);
        let side = if self.key < target {
            Side::Right
        } else {
            Side::Left
        };
        for l in (0..=top).rev() {
            if let Some(n) = self.get(l, side) {
                let ok = match side {
                    Side::Right => n.key <= target,
                    Side::Left => n.key >= target,
                };
                if ok {
                    return SearchAction::Forward {
                        next: n.clone(),
                        level: l,
                    };
                }
            }
        }
        self.exhausted(target)
    }

    fn exhausted(&self, target: u32) -> SearchAction {
        if self.key <= target {
            return SearchAction::Local;
        }
        // nothing left of us is >= target, our level 0 left neighbour is the
        // greatest key below it
        match self.get(0, Side::Left) {
            Some(n) => SearchAction::Found(n.clone()),
            None => SearchAction::Local,
        }
    }

    /// Decide whether `node` becomes our `side` neighbour at `level`.
    ///
    /// When our current neighbour sits between us and `node` the request is
    /// forwarded to it, otherwise `node` takes the slot.
    pub fn change_neighbour(&mut self, node: &SGNode, side: Side, level: usize) -> Result<LinkAction> {
        if let Some(current) = self.get(level, side) {
            let closer = match side {
                Side::Right => current.key < node.key,
                Side::Left => current.key > node.key,
            };
            if closer {
                return Ok(LinkAction::Forward(current.clone()));
            }
        }
        self.set(level, side, Some(node.clone()))?;
        Ok(LinkAction::Link)
    }

    /// Handle a buddy request: does our bit at `level` equal `bit`?
    /// `side` is the slot the originator wants to occupy in our table.
    pub fn buddy_step(
        &mut self,
        originator: &SGNode,
        level: usize,
        bit: u8,
        side: Side,
    ) -> Result<BuddyAction> {
        if self.mv.bit(level) == bit {
            return self
                .change_neighbour(originator, side, level + 1)
                .map(BuddyAction::Link);
        }
        Ok(match self.get(level, side.opposite()) {
            Some(n) => BuddyAction::Forward(n.clone()),
            None => BuddyAction::Exhausted,
        })
    }

    /// Link a whole population at once, without any message exchange.
    ///
    /// The result is sorted by key and has the shape a sequence of joins
    /// would produce. Used to study search on large graphs.
    pub fn build_population(nodes: &[SGNode]) -> Result<Vec<RoutingTable>> {
        let mut sorted: Vec<&SGNode> = nodes.iter().collect();
        sorted.sort_by_key(|n| n.key);
        let mut tables: Vec<RoutingTable> = sorted
            .iter()
            .map(|n| RoutingTable::new(n.key, n.mv.clone()))
            .collect();
        let mut alone = vec![false; sorted.len()];
        let top = sorted.iter().map(|n| n.mv.len()).min().unwrap_or(0);

        for level in 0..=top {
            let mut last: HashMap<Vec<u8>, usize> = HashMap::new();
            for i in 0..sorted.len() {
                if alone[i] {
                    continue;
                }
                let prefix: Vec<u8> = (0..level).map(|b| sorted[i].mv.bit(b)).collect();
                tables[i].grow(level)?;
                if let Some(j) = last.insert(prefix, i) {
                    tables[j].set(level, Side::Right, Some(sorted[i].clone()))?;
                    tables[i].set(level, Side::Left, Some(sorted[j].clone()))?;
                }
            }
            for (i, table) in tables.iter_mut().enumerate() {
                if alone[i] {
                    continue;
                }
                table.max_level = level;
                if table.levels[level].is_empty() {
                    alone[i] = true;
                }
            }
        }
        Ok(tables)
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.levels.iter().all(Level::is_empty) {
            return write!(f, "<empty routing table>");
        }
        let show = |n: Option<&SGNode>| n.map_or("-".to_string(), |n| n.key.to_string());
        let mut first = true;
        for (i, level) in self.levels.iter().enumerate() {
            if level.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(
                f,
                "Level {}: LEFT={}, RIGHT={}",
                i,
                show(level.left.as_ref()),
                show(level.right.as_ref())
            )?;
        }
        Ok(())
    }
}
