use crate::Tier;
use std::collections::HashMap;

/// Tier adjacency in the direction counters are released:
/// child to parents while solving, parent to children while discovering.
/// Each list is detached exactly once.
#[derive(Debug, Default)]
pub struct ReverseTierGraph {
    edges: HashMap<Tier, Vec<Tier>>,
}

impl ReverseTierGraph {
    pub fn add(&mut self, from: Tier, to: Tier) {
        self.edges.entry(from).or_default().push(to);
    }
    pub fn get(&self, from: Tier) -> &[Tier] {
        self.edges.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }
    /// Move the list for `from` out; later calls see an empty list.
    pub fn pop(&mut self, from: Tier) -> Vec<Tier> {
        self.edges.remove(&from).unwrap_or_default()
    }
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
