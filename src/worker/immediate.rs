use crate::REMOTENESS_MAX;
use crate::Tier;
use crate::database::Database;
use crate::database::Store;
use crate::error::SolveError;
use crate::game::Api;
use crate::game::Outcome;
use crate::game::TierPosition;
use crate::game::Value;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Immediate transition for tiers whose moves all leave the tier.
///
/// Child tiers are loaded in batches that fit the memory budget, largest
/// first. Each batch refines every position's outcome with the best
/// negated outcome among its loaded children, so after every child tier
/// has been loaded once each position holds its final outcome.
pub struct Immediate<'a> {
    api: &'a Api,
    tier: Tier,
    size: u64,
    memory: usize,
    db: Database,
}

impl<'a> Immediate<'a> {
    pub fn new(api: &'a Api, store: Arc<dyn Store>, tier: Tier, memory: usize) -> Self {
        Self {
            api,
            tier,
            size: api.tier_size(tier),
            memory,
            db: Database::from(store),
        }
    }

    pub fn solve(mut self) -> Result<(), SolveError> {
        let children = self.children();
        let available = self.memory.saturating_sub(self.db.usage_of(self.size));
        if let Some(&(tier, size)) = children.last() {
            let needed = self.db.usage_of(size);
            if needed > available {
                return Err(SolveError::InsufficientMemory {
                    tier,
                    needed,
                    available,
                });
            }
        }
        self.db.create_solving_tier(self.tier, self.size)?;
        let ref known = children.iter().map(|&(t, _)| t).collect::<HashSet<_>>();
        let mut processed = vec![false; children.len()];
        let mut pass = 0;
        loop {
            let mut budget = available;
            for (i, &(child, size)) in children.iter().enumerate().rev() {
                let usage = self.db.usage_of(size);
                if !processed[i] && usage <= budget {
                    self.db.load_tier(child, size)?;
                    processed[i] = true;
                    budget -= usage;
                }
            }
            let last = processed.iter().all(|&p| p);
            self.sweep(known, pass == 0, last)?;
            self.db.unload_all();
            pass += 1;
            if last {
                break;
            }
        }
        log::debug!(
            "{:<32}{:<32}",
            format!("tier {} passes", self.api.tier_name(self.tier)),
            pass
        );
        self.db.flush_solving_tier()?;
        self.db.free_solving_tier();
        Ok(())
    }

    /// Canonical child tiers with their sizes, smallest first.
    fn children(&self) -> Vec<(Tier, u64)> {
        let mut children = self
            .api
            .canonical_child_tiers(self.tier)
            .into_iter()
            .map(|t| (t, self.api.tier_size(t)))
            .collect::<Vec<_>>();
        children.sort_by_key(|&(t, size)| (size, t));
        children
    }

    /// One parallel pass over the tier against the currently loaded children.
    fn sweep(&self, known: &HashSet<Tier>, first: bool, last: bool) -> Result<(), SolveError> {
        (0..self.size).into_par_iter().try_for_each(|position| {
            let at = TierPosition::new(self.tier, position);
            if !self.api.is_legal(at) || !self.api.is_canonical_position(at) {
                return Ok(());
            }
            match self.api.primitive(at) {
                Value::Undecided => {}
                value => {
                    if first {
                        self.db.set(position, Outcome::new(value, 0));
                    }
                    return Ok(());
                }
            }
            let children = self.api.canonical_child_positions(at);
            if children.is_empty() {
                return Err(SolveError::NoChildren(at));
            }
            let mut best = self.db.get(position);
            for child in children {
                let image = self.api.canonical(child);
                if !known.contains(&image.tier) {
                    return Err(SolveError::UnknownChildTier(at, child.tier));
                }
                let outcome = self.db.get_from_loaded(image);
                if outcome.is_decided() {
                    best = best.max(outcome.negate());
                }
            }
            if best.remoteness > REMOTENESS_MAX {
                return Err(SolveError::RemotenessOverflow(at));
            }
            if last && !best.is_decided() {
                return Err(SolveError::IllegalChildValue(at));
            }
            self.db.set(position, best);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::database::Records;
    use crate::games::ExplicitGame;
    use crate::game::TierType;

    /// Tier 0 holds four primitives, tier 1 eight positions with one move each.
    fn two_tiers() -> Api {
        let mut builder = ExplicitGame::builder()
            .tier(0, 4, TierType::ImmediateTransition)
            .tier(1, 8, TierType::ImmediateTransition)
            .primitive((0, 0), Value::Lose)
            .primitive((0, 1), Value::Lose)
            .primitive((0, 2), Value::Win)
            .primitive((0, 3), Value::Win)
            .initial((1, 0));
        for p in 0..8 {
            builder = builder.edge((1, p), (0, p % 4));
        }
        Api::new(builder.build())
    }

    fn solve(api: &Api, store: &Arc<MemoryStore>, tier: Tier, memory: usize) -> Result<(), SolveError> {
        Immediate::new(api, store.clone(), tier, memory).solve()
    }

    #[test]
    fn two_tier_scenario() {
        let ref api = two_tiers();
        let ref store = Arc::new(MemoryStore::new());
        solve(api, store, 0, usize::MAX).unwrap();
        solve(api, store, 1, usize::MAX).unwrap();
        for p in 0..8 {
            let outcome = store.probe(TierPosition::new(1, p)).unwrap();
            let expected = match p % 4 {
                0 | 1 => Value::Win,
                _ => Value::Lose,
            };
            assert!(outcome.value == expected);
            assert!(outcome.remoteness == 1);
        }
    }

    #[test]
    fn too_little_memory_for_the_largest_child() {
        let ref api = two_tiers();
        let ref store = Arc::new(MemoryStore::new());
        solve(api, store, 0, usize::MAX).unwrap();
        let memory = Records::usage(8) + Records::usage(4) - 1;
        let error = solve(api, store, 1, memory).unwrap_err();
        assert!(matches!(error, SolveError::InsufficientMemory { tier: 0, .. }));
        assert!(error.is_resource());
        assert!(store.status(1) == crate::database::Status::Missing);
    }

    #[test]
    fn children_are_loaded_in_several_passes() {
        // position 0 of tier 3 can move to tiers 0, 1 and 2; only one fits at a time
        let api = Api::new(
            ExplicitGame::builder()
                .tier(0, 4, TierType::ImmediateTransition)
                .tier(1, 4, TierType::ImmediateTransition)
                .tier(2, 4, TierType::ImmediateTransition)
                .tier(3, 1, TierType::ImmediateTransition)
                .primitive((0, 0), Value::Win)
                .primitive((1, 0), Value::Tie)
                .primitive((2, 0), Value::Lose)
                .primitive((0, 1), Value::Lose)
                .primitive((0, 2), Value::Lose)
                .primitive((0, 3), Value::Lose)
                .primitive((1, 1), Value::Lose)
                .primitive((1, 2), Value::Lose)
                .primitive((1, 3), Value::Lose)
                .primitive((2, 1), Value::Lose)
                .primitive((2, 2), Value::Lose)
                .primitive((2, 3), Value::Lose)
                .edge((3, 0), (0, 0))
                .edge((3, 0), (1, 0))
                .edge((3, 0), (2, 0))
                .initial((3, 0))
                .build(),
        );
        let ref api = api;
        let ref store = Arc::new(MemoryStore::new());
        for tier in 0..3 {
            solve(api, store, tier, usize::MAX).unwrap();
        }
        solve(api, store, 3, Records::usage(1) + Records::usage(4)).unwrap();
        let outcome = store.probe(TierPosition::new(3, 0)).unwrap();
        assert!(outcome.value == Value::Win);
        assert!(outcome.remoteness == 1);
    }

    #[test]
    fn dead_ends_are_reported() {
        let api = Api::new(
            ExplicitGame::builder()
                .tier(0, 2, TierType::ImmediateTransition)
                .primitive((0, 0), Value::Lose)
                .initial((0, 1))
                .build(),
        );
        let ref store = Arc::new(MemoryStore::new());
        let error = solve(&api, store, 0, usize::MAX).unwrap_err();
        assert!(matches!(error, SolveError::NoChildren(_)));
        assert!(!error.is_resource());
    }
}
