use super::Budget;
use crate::Position;
use crate::Tier;
use crate::error::SolveError;
use crate::game::TierPosition;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Position-level parent lists for one tier solve, held in a single arena.
///
/// Keys are positions of the solving tier and its child tiers, flattened
/// through a tier offset table fixed at construction. Values are the
/// solving-tier positions that reach the key in one move.
///
/// The graph is built in two passes over the solving tier. The first
/// [`count`](ReverseGraph::count)s every edge against its child slot,
/// [`seal`](ReverseGraph::seal) sizes the arena from those counts, and the
/// second pass [`add`](ReverseGraph::add)s each parent into its slot's range.
/// Every slot owns `starts[i]..starts[i + 1]` of the arena; its cursor runs
/// from the start to the end of that range while filling.
#[derive(Debug)]
pub struct ReverseGraph {
    offsets: HashMap<Tier, (usize, u64)>,
    starts: Vec<usize>,
    cursors: Vec<AtomicUsize>,
    parents: Vec<AtomicU64>,
}

impl ReverseGraph {
    /// Bytes of slot bookkeeping for `slots` child positions.
    pub fn usage(slots: usize) -> usize {
        slots * std::mem::size_of::<AtomicUsize>() + (slots + 1) * std::mem::size_of::<usize>()
    }

    /// `tiers` lists every tier a child position may live in, with its size.
    /// Slot bookkeeping is charged to `budget` here; the arena at [`seal`](Self::seal).
    pub fn new(tiers: &[(Tier, u64)], budget: &Budget) -> Result<Self, SolveError> {
        let mut offsets = HashMap::with_capacity(tiers.len());
        let mut total = 0usize;
        for &(tier, size) in tiers {
            offsets.entry(tier).or_insert_with(|| {
                let offset = total;
                total += size as usize;
                (offset, size)
            });
        }
        budget.charge(Self::usage(total))?;
        let mut cursors = Vec::new();
        cursors
            .try_reserve_exact(total)
            .map_err(|_| SolveError::OutOfMemory(Self::usage(total)))?;
        cursors.extend((0..total).map(|_| AtomicUsize::new(0)));
        Ok(Self {
            offsets,
            starts: Vec::new(),
            cursors,
            parents: Vec::new(),
        })
    }
    fn index(&self, child: TierPosition) -> Option<usize> {
        self.offsets
            .get(&child.tier)
            .filter(|(_, size)| child.position < *size)
            .map(|(offset, _)| offset + child.position as usize)
    }
    pub fn contains(&self, tier: Tier) -> bool {
        self.offsets.contains_key(&tier)
    }
    pub fn slots(&self) -> usize {
        self.cursors.len()
    }
    pub fn edges(&self) -> usize {
        self.parents.len()
    }

    /// Count one edge into `child`. False if `child` lies outside the graph's tiers.
    pub fn count(&self, child: TierPosition) -> bool {
        match self.index(child) {
            Some(i) => {
                self.cursors[i].fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Turn edge counts into slot ranges and allocate the arena.
    pub fn seal(&mut self, budget: &Budget) -> Result<(), SolveError> {
        let edges = self
            .cursors
            .iter_mut()
            .map(|c| *c.get_mut())
            .sum::<usize>();
        let bytes = edges * std::mem::size_of::<AtomicU64>();
        budget.charge(bytes)?;
        self.starts
            .try_reserve_exact(self.cursors.len() + 1)
            .map_err(|_| SolveError::OutOfMemory(self.cursors.len() * std::mem::size_of::<usize>()))?;
        self.parents
            .try_reserve_exact(edges)
            .map_err(|_| SolveError::OutOfMemory(bytes))?;
        let mut start = 0;
        for cursor in self.cursors.iter_mut() {
            self.starts.push(start);
            start += std::mem::replace(cursor.get_mut(), start);
        }
        self.starts.push(start);
        self.parents.extend((0..edges).map(|_| AtomicU64::new(0)));
        Ok(())
    }

    /// Place `parent` in the range of `child`. False if `child` lies outside
    /// the graph, or gets more edges than were counted for it.
    pub fn add(&self, child: TierPosition, parent: Position) -> bool {
        let Some(i) = self.index(child) else {
            return false;
        };
        let end = self.starts.get(i + 1).copied().unwrap_or(0);
        match self.cursors[i].fetch_add(1, Ordering::AcqRel) {
            j if j < end => {
                self.parents[j].store(parent, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Detach and return the parents of `child`. Each list is handed out once.
    pub fn pop_parents_of(&self, child: TierPosition) -> Vec<Position> {
        let Some(i) = self.index(child) else {
            return Vec::new();
        };
        let Some(&start) = self.starts.get(i) else {
            return Vec::new();
        };
        let end = self.cursors[i].swap(start, Ordering::AcqRel).min(self.starts[i + 1]);
        self.parents[start..end.max(start)]
            .iter()
            .map(|p| p.load(Ordering::Relaxed))
            .collect()
    }
}
