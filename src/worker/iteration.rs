use crate::REMOTENESS_MAX;
use crate::Remoteness;
use crate::Tier;
use crate::database::Database;
use crate::database::Records;
use crate::database::Store;
use crate::error::SolveError;
use crate::game::Api;
use crate::game::Outcome;
use crate::game::TierPosition;
use crate::game::Value;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Value iteration over a whole tier, loops included.
///
/// Every canonical child tier stays loaded for the whole solve. Each
/// round `i` sweeps the undecided positions: one with a child losing in
/// `i - 1` wins in `i`, and one whose children all win, the slowest in
/// `i - 1`, loses in `i`. Rounds run until nothing changes and no child
/// tier holds a deeper win or loss. Ties follow the same way, and what
/// remains undecided is a draw.
///
/// Needs no counters and no parents, at the price of a full sweep per
/// remoteness and room for every child tier at once.
pub struct Iteration<'a> {
    api: &'a Api,
    tier: Tier,
    size: u64,
    memory: usize,
    db: Database,
}

impl<'a> Iteration<'a> {
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
        let mut children = self.api.canonical_child_tiers(self.tier);
        children.retain(|&t| t != self.tier);
        let needed = self.db.usage_of(self.size)
            + children
                .iter()
                .map(|&t| self.db.usage_of(self.api.tier_size(t)))
                .sum::<usize>();
        if needed > self.memory {
            return Err(SolveError::InsufficientMemory {
                tier: self.tier,
                needed,
                available: self.memory,
            });
        }
        self.db.create_solving_tier(self.tier, self.size)?;
        for &child in children.iter() {
            self.db.load_tier(child, self.api.tier_size(child))?;
        }
        self.scan()?;
        let (decisive, tying) = self.depths(&children);
        let mut rounds = 0;
        for (classes, deepest) in [(true, decisive), (false, tying)] {
            let mut remoteness = 1;
            let mut updated = true;
            while updated || remoteness <= deepest + 1 {
                updated = self.round(remoteness, classes)?;
                remoteness += 1;
                rounds += 1;
            }
        }
        log::debug!(
            "{:<32}{:<32}",
            format!("tier {} rounds", self.api.tier_name(self.tier)),
            rounds
        );
        self.settle();
        self.db.unload_all();
        self.db.flush_solving_tier()?;
        self.db.free_solving_tier();
        Ok(())
    }

    /// Decide primitives. Positions outside the solve are parked as draws
    /// so that rounds skip them.
    fn scan(&self) -> Result<(), SolveError> {
        (0..self.size).into_par_iter().try_for_each(|position| {
            let at = TierPosition::new(self.tier, position);
            if !self.api.is_legal(at) || !self.api.is_canonical_position(at) {
                self.db.set(position, Outcome::new(Value::Draw, 0));
                return Ok(());
            }
            match self.api.primitive(at) {
                Value::Undecided if self.api.canonical_child_positions(at).is_empty() => {
                    Err(SolveError::NoChildren(at))
                }
                Value::Undecided => Ok(()),
                value => {
                    self.db.set(position, Outcome::new(value, 0));
                    Ok(())
                }
            }
        })
    }

    /// Deepest win-or-lose and tie remoteness among the loaded child tiers.
    fn depths(&self, children: &[Tier]) -> (Remoteness, Remoteness) {
        children
            .iter()
            .filter_map(|&t| self.db.loaded(t))
            .flat_map(|records| records.raw().map(Records::unpack))
            .fold((0, 0), |(decisive, tying), outcome| match outcome.value {
                Value::Win | Value::Lose => (decisive.max(outcome.remoteness), tying),
                Value::Tie => (decisive, tying.max(outcome.remoteness)),
                _ => (decisive, tying),
            })
    }

    /// One sweep deciding positions at `remoteness`. True if any changed.
    fn round(&self, remoteness: Remoteness, decisive: bool) -> Result<bool, SolveError> {
        let updated = AtomicBool::new(false);
        (0..self.size).into_par_iter().try_for_each(|position| {
            if self.db.get(position).is_decided() {
                return Ok(());
            }
            let at = TierPosition::new(self.tier, position);
            let outcomes = self
                .api
                .canonical_child_positions(at)
                .into_iter()
                .map(|child| self.outcome(at, child))
                .collect::<Result<Vec<_>, _>>()?;
            let previous = remoteness - 1;
            let value = match decisive {
                true if outcomes
                    .iter()
                    .any(|o| o.value == Value::Lose && o.remoteness == previous) =>
                {
                    Value::Win
                }
                true if outcomes.iter().all(|o| o.value == Value::Win)
                    && outcomes.iter().map(|o| o.remoteness).max() == Some(previous) =>
                {
                    Value::Lose
                }
                false if outcomes
                    .iter()
                    .any(|o| o.value == Value::Tie && o.remoteness == previous) =>
                {
                    Value::Tie
                }
                _ => return Ok(()),
            };
            if remoteness > REMOTENESS_MAX {
                return Err(SolveError::RemotenessOverflow(at));
            }
            self.db.set(position, Outcome::new(value, remoteness));
            updated.store(true, Ordering::Relaxed);
            Ok(())
        })?;
        Ok(updated.into_inner())
    }

    /// Leftovers become draws and parked positions go back to undecided.
    fn settle(&self) {
        (0..self.size).into_par_iter().for_each(|position| {
            let at = TierPosition::new(self.tier, position);
            if !self.api.is_legal(at) || !self.api.is_canonical_position(at) {
                self.db.set(position, Outcome::default());
            } else if !self.db.get(position).is_decided() {
                self.db.set(position, Outcome::new(Value::Draw, 0));
            }
        })
    }

    fn outcome(&self, at: TierPosition, child: TierPosition) -> Result<Outcome, SolveError> {
        let image = self.api.canonical(child);
        match image.tier == self.tier {
            true => Ok(self.db.get(image.position)),
            false if self.db.is_tier_loaded(image.tier) => Ok(self.db.get_from_loaded(image)),
            false => Err(SolveError::UnknownChildTier(at, child.tier)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use crate::database::MemoryStore;
    use crate::game::TierType;
    use crate::games::ExplicitGame;
    use crate::games::TicTacToe;
    use crate::worker::Induction;

    fn stored(store: &MemoryStore, tier: Tier, position: Position) -> (Value, Remoteness) {
        let outcome = store.probe(TierPosition::new(tier, position)).unwrap();
        (outcome.value, outcome.remoteness)
    }

    #[test]
    fn loops_settle_like_induction() {
        // 0 <-> 1 -> 2 (lose), a pure cycle 3 <-> 4, and 6 -> {3, 7 (tie)}
        let ref api = Api::new(
            ExplicitGame::builder()
                .tier(0, 8, TierType::Loopy)
                .edge((0, 0), (0, 1))
                .edge((0, 1), (0, 0))
                .edge((0, 1), (0, 2))
                .primitive((0, 2), Value::Lose)
                .edge((0, 3), (0, 4))
                .edge((0, 4), (0, 3))
                .illegal((0, 5))
                .edge((0, 6), (0, 3))
                .edge((0, 6), (0, 7))
                .primitive((0, 7), Value::Tie)
                .initial((0, 0))
                .build(),
        );
        let ref iterated = Arc::new(MemoryStore::new());
        let ref induced = Arc::new(MemoryStore::new());
        Iteration::new(api, iterated.clone(), 0, usize::MAX)
            .solve()
            .unwrap();
        Induction::new(api, induced.clone(), 0, usize::MAX)
            .solve()
            .unwrap();
        assert!(stored(iterated, 0, 0) == (Value::Lose, 2));
        assert!(stored(iterated, 0, 1) == (Value::Win, 1));
        assert!(stored(iterated, 0, 3) == (Value::Draw, 0));
        assert!(stored(iterated, 0, 5) == (Value::Undecided, 0));
        assert!(stored(iterated, 0, 6) == (Value::Tie, 1));
        for p in 0..8 {
            assert!(stored(iterated, 0, p) == stored(induced, 0, p));
        }
    }

    #[test]
    fn tictactoe_agrees_with_induction() {
        let ref api = Api::new(TicTacToe::new().loopy());
        let ref iterated = Arc::new(MemoryStore::new());
        let ref induced = Arc::new(MemoryStore::new());
        for tier in (0..=9).rev() {
            Iteration::new(api, iterated.clone(), tier, usize::MAX)
                .solve()
                .unwrap();
            Induction::new(api, induced.clone(), tier, usize::MAX)
                .solve()
                .unwrap();
        }
        for tier in 0..=9 {
            for p in 0..api.tier_size(tier) {
                assert!(stored(iterated, tier, p) == stored(induced, tier, p));
            }
        }
        assert!(stored(iterated, 0, 0) == (Value::Tie, 9));
    }

    #[test]
    fn every_child_tier_must_fit() {
        let mut builder = ExplicitGame::builder()
            .tier(0, 4, TierType::Loopy)
            .tier(1, 4, TierType::Loopy)
            .tier(2, 1, TierType::Loopy)
            .primitive((0, 0), Value::Lose)
            .primitive((1, 0), Value::Lose)
            .edge((2, 0), (0, 0))
            .edge((2, 0), (1, 0))
            .initial((2, 0));
        for p in 1..4 {
            builder = builder.illegal((0, p)).illegal((1, p));
        }
        let ref api = Api::new(builder.build());
        let ref store = Arc::new(MemoryStore::new());
        for tier in 0..2 {
            Iteration::new(api, store.clone(), tier, usize::MAX)
                .solve()
                .unwrap();
        }
        let memory = Records::usage(1) + Records::usage(4);
        let error = Iteration::new(api, store.clone(), 2, memory)
            .solve()
            .unwrap_err();
        assert!(matches!(error, SolveError::InsufficientMemory { tier: 2, .. }));
        Iteration::new(api, store.clone(), 2, memory + Records::usage(4))
            .solve()
            .unwrap();
        assert!(stored(store, 2, 0) == (Value::Win, 1));
    }
}
