use super::*;
use crate::Tier;
use crate::error::GraphError;
use crate::game::Api;
use std::collections::HashMap;
use std::collections::HashSet;

/// What the dependency counters mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Counter is the number of unsolved distinct canonical child tiers.
    /// Releasing a tier decrements its canonical parents.
    Solving,
    /// Counter is the number of undiscovered distinct canonical parent tiers.
    /// Releasing a tier decrements its canonical children.
    Discovery,
}

/// Size of the largest tier and of the largest tier group
/// (a tier plus its largest canonical child tier).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct GraphStats {
    pub tiers: usize,
    pub canonical: usize,
    pub edges: usize,
    pub largest: (Tier, u64),
    pub group: (Tier, u64),
}

/// Every tier reachable from the initial tier with its dependency counter.
#[derive(Debug)]
pub struct TierGraph {
    mode: Mode,
    nodes: HashMap<Tier, Node>,
    edges: ReverseTierGraph,
    stats: GraphStats,
}

// construction
impl TierGraph {
    pub fn solving(api: &Api) -> Result<Self, GraphError> {
        Self::build(api, Mode::Solving)
    }
    pub fn discovery(api: &Api) -> Result<Self, GraphError> {
        Self::build(api, Mode::Discovery)
    }

    /// Iterative DFS with three-color marking. Meeting a tier that is
    /// still in progress means the tier graph has a cycle.
    fn build(api: &Api, mode: Mode) -> Result<Self, GraphError> {
        let root = match mode {
            Mode::Solving => api.initial_tier(),
            Mode::Discovery => api.canonical_tier(api.initial_tier()),
        };
        let mut graph = Self {
            mode,
            nodes: HashMap::from([(root, Node::default())]),
            edges: ReverseTierGraph::default(),
            stats: GraphStats::default(),
        };
        let mut fringe = vec![root];
        while let Some(&parent) = fringe.last() {
            match graph.node(parent).mark() {
                Mark::InProgress => {
                    graph.update(parent, |n| n.marked(Mark::Closed));
                    fringe.pop();
                    continue;
                }
                Mark::Closed => {
                    fringe.pop();
                    continue;
                }
                Mark::NotVisited => graph.update(parent, |n| n.marked(Mark::InProgress)),
            }
            for child in graph.expand(api, parent)? {
                match graph.nodes.entry(child).or_default().mark() {
                    Mark::NotVisited => fringe.push(child),
                    Mark::InProgress => {
                        return Err(GraphError::Cycle {
                            parent: api.tier_name(parent),
                            child: api.tier_name(child),
                        });
                    }
                    Mark::Closed => {}
                }
            }
        }
        graph.stats.tiers = graph.nodes.len();
        graph.stats.canonical = graph
            .nodes
            .keys()
            .filter(|&&t| api.is_canonical_tier(t))
            .count();
        graph.stats.edges = graph.edges.len();
        log::info!("{:<32}{:<32}", "tier graph tiers", graph.stats.tiers);
        log::info!("{:<32}{:<32}", "tier graph canonical tiers", graph.stats.canonical);
        Ok(graph)
    }

    /// Record `parent`'s dependencies and return the tiers to explore from it.
    fn expand(&mut self, api: &Api, parent: Tier) -> Result<Vec<Tier>, GraphError> {
        let raw = api.child_tiers(parent);
        let mut seen = HashSet::with_capacity(raw.len());
        if let Some(duplicate) = raw.iter().find(|&&child| !seen.insert(child)) {
            return Err(GraphError::DuplicateChild {
                parent: api.tier_name(parent),
                child: api.tier_name(*duplicate),
            });
        }
        let canonical = api.canonical_child_tiers(parent);
        self.measure(api, parent, &canonical);
        match self.mode {
            Mode::Solving => {
                if api.is_canonical_tier(parent) {
                    self.update(parent, |n| n.counted(canonical.len() as u64));
                    canonical.iter().for_each(|&c| self.edges.add(c, parent));
                }
                let mut explore = raw;
                explore.extend(canonical.into_iter().filter(|c| !seen.contains(c)));
                Ok(explore)
            }
            Mode::Discovery => {
                for &child in canonical.iter() {
                    let node = self.nodes.entry(child).or_default();
                    *node = node.incremented();
                    self.edges.add(parent, child);
                }
                Ok(canonical)
            }
        }
    }

    fn measure(&mut self, api: &Api, tier: Tier, children: &[Tier]) {
        let size = api.tier_size(tier);
        if size > self.stats.largest.1 {
            self.stats.largest = (tier, size);
        }
        if api.is_canonical_tier(tier) {
            let child = children.iter().map(|&c| api.tier_size(c)).max();
            let group = size + child.unwrap_or(0);
            if group > self.stats.group.1 {
                self.stats.group = (tier, group);
            }
        }
    }
}

// scheduling
impl TierGraph {
    pub fn mode(&self) -> Mode {
        self.mode
    }
    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }
    pub fn contains(&self, tier: Tier) -> bool {
        self.nodes.contains_key(&tier)
    }
    pub fn count(&self, tier: Tier) -> Option<u64> {
        self.nodes.get(&tier).map(Node::count)
    }
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.nodes.keys().copied()
    }
    /// Canonical tiers that list `tier` among their canonical children.
    /// Empty in discovery mode and once `tier` has been released.
    pub fn parents(&self, tier: Tier) -> &[Tier] {
        match self.mode {
            Mode::Solving => self.edges.get(tier),
            Mode::Discovery => &[],
        }
    }
    /// Tiers with nothing left to wait for, in ascending order.
    pub fn ready(&self) -> Vec<Tier> {
        let mut ready = self
            .nodes
            .iter()
            .filter(|(_, n)| n.count() == 0)
            .map(|(&t, _)| t)
            .collect::<Vec<_>>();
        ready.sort_unstable();
        ready
    }
    /// Release everything waiting on `tier` and return the tiers that became ready.
    /// Tiers symmetric to each other are decremented once.
    pub fn release(&mut self, api: &Api, tier: Tier) -> Result<Vec<Tier>, GraphError> {
        let mut dependents = self
            .edges
            .pop(tier)
            .into_iter()
            .map(|t| api.canonical_tier(t))
            .collect::<Vec<_>>();
        dependents.sort_unstable();
        dependents.dedup();
        let mut ready = Vec::new();
        for dependent in dependents {
            let node = self
                .nodes
                .get(&dependent)
                .copied()
                .unwrap_or_default()
                .decremented()
                .ok_or(GraphError::Underflow(dependent))?;
            self.nodes.insert(dependent, node);
            if node.count() == 0 {
                ready.push(dependent);
            }
        }
        Ok(ready)
    }

    fn node(&self, tier: Tier) -> Node {
        self.nodes.get(&tier).copied().unwrap_or_default()
    }
    fn update(&mut self, tier: Tier, f: impl FnOnce(Node) -> Node) {
        let node = self.node(tier);
        self.nodes.insert(tier, f(node));
    }
}
