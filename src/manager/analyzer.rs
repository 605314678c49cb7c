use super::*;
use crate::Position;
use crate::Remoteness;
use crate::Tier;
use crate::database::Records;
use crate::database::Status;
use crate::database::Store;
use crate::error::Error;
use crate::error::SolveError;
use crate::game::Api;
use crate::game::Outcome;
use crate::game::TierPosition;
use crate::game::Value;
use crate::graph::TierGraph;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// Reachable canonical positions by stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub tiers: usize,
    /// Tiers with nothing in the store; their positions count as undecided.
    pub unsolved: usize,
    pub positions: u64,
    /// Indexed by `Value::index`.
    pub counts: [u64; 5],
    /// Largest remoteness seen per value, indexed by `Value::index`.
    pub longest: [Remoteness; 5],
    pub seconds: f64,
}

impl Analysis {
    pub fn count(&self, value: Value) -> u64 {
        self.counts[value.index()]
    }
    pub fn longest(&self, value: Value) -> Remoteness {
        self.longest[value.index()]
    }
    fn tally(&mut self, outcome: Outcome) {
        let i = outcome.value.index();
        self.positions += 1;
        self.counts[i] += 1;
        self.longest[i] = self.longest[i].max(outcome.remoteness);
    }
    fn merge(mut self, other: Self) -> Self {
        self.positions += other.positions;
        for i in 0..Value::ALL.len() {
            self.counts[i] += other.counts[i];
            self.longest[i] = self.longest[i].max(other.longest[i]);
        }
        self
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "┌────────────┬───────────────┬────────────┐")?;
        writeln!(f, "│ Value      │     Positions │ Remoteness │")?;
        writeln!(f, "├────────────┼───────────────┼────────────┤")?;
        for value in [Value::Win, Value::Lose, Value::Tie, Value::Draw, Value::Undecided] {
            writeln!(
                f,
                "│ {:<10} │ {:>13} │ {:>10} │",
                value.to_string(),
                commas(self.count(value)),
                self.longest(value)
            )?;
        }
        writeln!(f, "├────────────┼───────────────┼────────────┤")?;
        writeln!(f, "│ Total      │ {:>13} │            │", commas(self.positions))?;
        writeln!(f, "│ Tiers      │ {:>13} │            │", commas(self.tiers))?;
        writeln!(f, "│ Unsolved   │ {:>13} │            │", commas(self.unsolved))?;
        write!(f, "└────────────┴───────────────┴────────────┘")
    }
}

/// Walks canonical tiers from the initial tier downward, discovering the
/// canonical positions actually reachable from the initial position and
/// tallying their stored outcomes.
///
/// A tier is analyzed once all its canonical parent tiers are, so its
/// discovered set is complete when its turn comes.
pub struct Analyzer {
    api: Api,
    store: Arc<dyn Store>,
    pending: HashMap<Tier, Vec<AtomicBool>>,
}

impl Analyzer {
    pub fn new(api: Api, store: Arc<dyn Store>) -> Self {
        Self {
            api,
            store,
            pending: HashMap::new(),
        }
    }

    pub fn analyze(mut self) -> Result<Analysis, Error> {
        let start = Instant::now();
        let mut graph = TierGraph::discovery(&self.api)?;
        let mut queue = VecDeque::from(graph.ready());
        let initial = self.api.canonical(self.api.initial());
        self.seen(initial.tier)?[initial.position as usize].store(true, Ordering::Relaxed);
        let mut analysis = Analysis::default();
        while let Some(tier) = queue.pop_front() {
            let tally = self.discover(tier)?;
            log::debug!(
                "{:<32}{:<32}",
                format!("analyzed    tier {}", self.api.tier_name(tier)),
                tally.positions
            );
            analysis = analysis.merge(tally);
            analysis.tiers += 1;
            if self.store.status(tier) != Status::Solved {
                analysis.unsolved += 1;
            }
            queue.extend(graph.release(&self.api, tier)?);
        }
        analysis.seconds = start.elapsed().as_secs_f64();
        Ok(analysis)
    }

    /// Discovery bitmap of `tier`, created on first use.
    fn seen(&mut self, tier: Tier) -> Result<&Vec<AtomicBool>, SolveError> {
        if !self.pending.contains_key(&tier) {
            let size = self.api.tier_size(tier) as usize;
            let mut bits = Vec::new();
            bits.try_reserve_exact(size)
                .map_err(|_| SolveError::OutOfMemory(size))?;
            bits.extend((0..size).map(|_| AtomicBool::new(false)));
            self.pending.insert(tier, bits);
        }
        Ok(&self.pending[&tier])
    }

    /// Close `tier`'s discovered set under moves, mark the positions it
    /// reaches in child tiers, and tally its outcomes.
    fn discover(&mut self, tier: Tier) -> Result<Analysis, Error> {
        for child in self.api.canonical_child_tiers(tier) {
            self.seen(child)?;
        }
        self.seen(tier)?;
        let seen = self.pending.remove(&tier).unwrap_or_default();
        let mut layer = (0..seen.len())
            .into_par_iter()
            .filter(|&p| seen[p].load(Ordering::Relaxed))
            .map(|p| p as Position)
            .collect::<Vec<_>>();
        while !layer.is_empty() {
            layer = layer
                .par_iter()
                .flat_map_iter(|&p| self.api.canonical_child_positions(TierPosition::new(tier, p)))
                .map(|child| self.api.canonical(child))
                .filter_map(|image| match image.tier == tier {
                    true => (!seen[image.position as usize].swap(true, Ordering::Relaxed))
                        .then_some(image.position),
                    false => {
                        if let Some(bits) = self.pending.get(&image.tier) {
                            bits[image.position as usize].store(true, Ordering::Relaxed);
                        }
                        None
                    }
                })
                .collect();
        }
        let records = match self.store.status(tier) {
            Status::Solved => Some(self.store.load(tier, seen.len() as u64)?),
            _ => None,
        };
        let outcome = |p: usize| -> Outcome {
            records
                .as_ref()
                .map(|r: &Records| r.get(p as Position))
                .unwrap_or_default()
        };
        Ok((0..seen.len())
            .into_par_iter()
            .filter(|&p| seen[p].load(Ordering::Relaxed))
            .map(outcome)
            .fold(Analysis::default, |mut a, o| {
                a.tally(o);
                a
            })
            .reduce(Analysis::default, Analysis::merge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::game::TierType;
    use crate::games::ExplicitGame;
    use crate::solver::Options;
    use crate::worker::Worker;

    /// Tier 1 has an unreachable position 2; tier 0 position 3 is reached only through it.
    fn api() -> Api {
        Api::new(
            ExplicitGame::builder()
                .tier(0, 4, TierType::Loopy)
                .tier(1, 3, TierType::Loopy)
                .primitive((0, 0), Value::Lose)
                .primitive((0, 3), Value::Win)
                .edge((0, 1), (0, 0))
                .edge((0, 2), (0, 1))
                .edge((1, 0), (1, 1))
                .edge((1, 1), (0, 2))
                .edge((1, 2), (0, 3))
                .initial((1, 0))
                .build(),
        )
    }

    #[test]
    fn only_reachable_positions_are_counted() {
        let ref api = api();
        let store = Arc::new(MemoryStore::new());
        let worker = Worker::new(api.clone(), store.clone(), &Options::default()).unwrap();
        worker.solve(0, false).unwrap();
        worker.solve(1, false).unwrap();
        let analysis = Analyzer::new(api.clone(), store).analyze().unwrap();
        assert!(analysis.tiers == 2);
        assert!(analysis.unsolved == 0);
        assert!(analysis.positions == 5);
        assert!(analysis.count(Value::Lose) == 3);
        assert!(analysis.count(Value::Win) == 2);
        assert!(analysis.longest(Value::Lose) == 4);
        assert!(analysis.to_string().contains("Total"));
    }

    #[test]
    fn unsolved_tiers_count_as_undecided() {
        let analysis = Analyzer::new(api(), Arc::new(MemoryStore::new()))
            .analyze()
            .unwrap();
        assert!(analysis.unsolved == 2);
        assert!(analysis.count(Value::Undecided) == 5);
    }
}
