use super::*;
use crate::CHILD_TIERS_MAX;
use crate::FRONTIER_SIZE;
use crate::Position;
use crate::REMOTENESS_MAX;
use crate::Remoteness;
use crate::Tier;
use crate::database::Database;
use crate::database::Store;
use crate::error::SolveError;
use crate::game::Api;
use crate::game::Outcome;
use crate::game::TierPosition;
use crate::game::Value;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU16;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

/// Counter of a position that takes no part in the solve.
const ILLEGAL: u32 = u32::MAX;

/// How backward induction finds the positions to propagate next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Frontiers when they fit the budget, frontierless otherwise.
    #[default]
    Auto,
    /// Queue decided positions by remoteness.
    Frontier,
    /// Rescan the tables at every remoteness. Needs the game to list parents.
    Frontierless,
}

/// Backward induction, for tiers with intra-tier moves (and any other tier).
///
/// Every undecided position counts its distinct canonical children.
/// Known outcomes spread to parents in increasing remoteness: a losing
/// child makes its parents winning, the last winning child makes a parent
/// losing, and after all wins and losses are settled a tying child makes
/// its remaining parents tying. Whatever is left with children outstanding
/// is a draw.
///
/// With frontiers, decided positions are queued per remoteness and parents
/// come from the game or from a reverse graph built during the scan.
/// Without frontiers, each remoteness level rescans the child tiers and
/// the solving tier for positions at that level, and parents must come
/// from the game. Everything the solve holds is charged to one [`Budget`];
/// a frontier solve that runs out falls back to the frontierless one when
/// the game can list parents.
pub struct Induction<'a> {
    api: &'a Api,
    tier: Tier,
    size: u64,
    strategy: Strategy,
    children: Vec<Tier>,
    budget: Arc<Budget>,
    db: Database,
    counters: Vec<AtomicU32>,
    frontiers: Vec<Frontier>,
    reverse: Option<ReverseGraph>,
    deepest: [AtomicU16; 3],
}

impl<'a> Induction<'a> {
    pub fn new(api: &'a Api, store: Arc<dyn Store>, tier: Tier, memory: usize) -> Self {
        let mut children = api.child_tiers(tier);
        children.sort_unstable();
        children.dedup();
        Self {
            api,
            tier,
            size: api.tier_size(tier),
            strategy: Strategy::Auto,
            children,
            budget: Arc::new(Budget::new(memory)),
            db: Database::from(store),
            counters: Vec::new(),
            frontiers: Vec::new(),
            reverse: None,
            deepest: Default::default(),
        }
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn solve(mut self) -> Result<(), SolveError> {
        match self.choose()? {
            Strategy::Frontierless => self.frontierless()?,
            _ => match self.percolate() {
                Err(e) if e.is_memory() && self.fallback() => {
                    log::warn!(
                        "{:<32}{}",
                        format!("frontierless tier {}", self.api.tier_name(self.tier)),
                        e
                    );
                    self.release();
                    self.frontierless()?
                }
                result => result?,
            },
        }
        self.db.flush_solving_tier()?;
        self.db.free_solving_tier();
        Ok(())
    }

    /// Pick the strategy from the budget unless one was forced.
    fn choose(&self) -> Result<Strategy, SolveError> {
        if self.children.len() + 1 > CHILD_TIERS_MAX {
            return Err(SolveError::TooManyChildren {
                tier: self.tier,
                count: self.children.len(),
            });
        }
        match self.strategy {
            Strategy::Frontierless if !self.api.has_retrograde() => Err(SolveError::NoParents(self.tier)),
            Strategy::Auto if self.fallback() && self.base() + self.overhead() > self.budget.limit() => {
                Ok(Strategy::Frontierless)
            }
            Strategy::Auto => Ok(Strategy::Frontier),
            strategy => Ok(strategy),
        }
    }
    fn fallback(&self) -> bool {
        self.strategy == Strategy::Auto && self.api.has_retrograde()
    }

    /// Frontier percolation.
    fn percolate(&mut self) -> Result<(), SolveError> {
        self.prepare(self.base() + self.overhead())?;
        if !self.api.has_retrograde() {
            self.reverse = Some(ReverseGraph::new(&self.slots(), &self.budget)?);
        }
        for _ in 0..3 {
            let frontier = Frontier::new(self.own() + 1, self.budget.clone())?;
            self.frontiers.push(frontier);
        }
        self.load()?;
        self.scan()?;
        self.link()?;
        for frontier in self.frontiers.iter_mut() {
            frontier.accumulate();
        }
        for remoteness in 0..=REMOTENESS_MAX {
            self.propagate(Value::Lose, remoteness)?;
            self.propagate(Value::Win, remoteness)?;
        }
        for remoteness in 0..=REMOTENESS_MAX {
            self.propagate(Value::Tie, remoteness)?;
        }
        self.residue();
        Ok(())
    }

    /// Level-by-level rescans with game-listed parents.
    fn frontierless(&mut self) -> Result<(), SolveError> {
        self.prepare(self.base())?;
        self.scan()?;
        let ref levels = self.census()?;
        let reach = |mask: u8| {
            levels
                .iter()
                .flat_map(|flags| flags.iter().rposition(|&f| f & mask != 0))
                .max()
                .unwrap_or(0)
        };
        let decisive = reach(Self::flag(Value::Win) | Self::flag(Value::Lose));
        for remoteness in 0..=REMOTENESS_MAX {
            let own = self.depth(Value::Win).max(self.depth(Value::Lose));
            if remoteness as usize > decisive && remoteness > own {
                break;
            }
            self.sweep(Value::Lose, remoteness, levels)?;
            self.sweep(Value::Win, remoteness, levels)?;
        }
        let tying = reach(Self::flag(Value::Tie));
        for remoteness in 0..=REMOTENESS_MAX {
            if remoteness as usize > tying && remoteness > self.depth(Value::Tie) {
                break;
            }
            self.sweep(Value::Tie, remoteness, levels)?;
        }
        self.residue();
        Ok(())
    }

    /// Drop everything a failed percolation allocated.
    fn release(&mut self) {
        self.db.free_solving_tier();
        self.db.unload_all();
        self.counters = Vec::new();
        self.frontiers = Vec::new();
        self.reverse = None;
        self.deepest = Default::default();
        self.budget.reset();
    }
}

// phases
impl Induction<'_> {
    /// Check the budget, then allocate records and counters.
    fn prepare(&mut self, needed: usize) -> Result<(), SolveError> {
        if needed > self.budget.remaining() {
            return Err(SolveError::InsufficientMemory {
                tier: self.tier,
                needed,
                available: self.budget.remaining(),
            });
        }
        self.budget.charge(self.base())?;
        self.db.create_solving_tier(self.tier, self.size)?;
        self.counters
            .try_reserve_exact(self.size as usize)
            .map_err(|_| SolveError::OutOfMemory(self.size as usize * std::mem::size_of::<AtomicU32>()))?;
        self.counters
            .extend((0..self.size).map(|_| AtomicU32::new(ILLEGAL)));
        Ok(())
    }

    /// Push the decided positions of every child tier onto the frontiers,
    /// one child tier at a time so that frontier entries stay grouped.
    fn load(&mut self) -> Result<(), SolveError> {
        for (source, child) in self.children.clone().into_iter().enumerate() {
            let canonical = self.api.canonical_tier(child);
            self.db.load_tier(canonical, self.api.tier_size(canonical))?;
            self.visit(child, |at, outcome| self.enqueue(at, outcome, source))?;
            self.db.unload_tier(canonical);
        }
        Ok(())
    }

    /// Decide primitives, count children of everything else,
    /// and count reverse edges when the game cannot list parents.
    fn scan(&self) -> Result<(), SolveError> {
        (0..self.size).into_par_iter().try_for_each(|position| {
            let at = TierPosition::new(self.tier, position);
            if !self.api.is_legal(at) || !self.api.is_canonical_position(at) {
                return Ok(());
            }
            match self.api.primitive(at) {
                Value::Undecided => {}
                Value::Draw => {
                    self.db.set(position, Outcome::new(Value::Draw, 0));
                    self.counters[position as usize].store(0, Ordering::Relaxed);
                    return Ok(());
                }
                value => {
                    let outcome = Outcome::new(value, 0);
                    self.db.set(position, outcome);
                    self.counters[position as usize].store(0, Ordering::Relaxed);
                    return self.enqueue(at, outcome, self.own());
                }
            }
            let children = self.api.canonical_child_positions(at);
            if children.is_empty() {
                return Err(SolveError::NoChildren(at));
            }
            if let Some(ref reverse) = self.reverse {
                for &child in children.iter() {
                    if !reverse.count(child) {
                        return Err(SolveError::UnknownChildTier(at, child.tier));
                    }
                }
            }
            let count = u32::try_from(children.len())
                .ok()
                .filter(|&n| n < ILLEGAL)
                .ok_or(SolveError::TooManyChildren {
                    tier: self.tier,
                    count: children.len(),
                })?;
            self.counters[position as usize].store(count, Ordering::Relaxed);
            Ok(())
        })
    }

    /// Size the reverse graph from the scan's counts and fill it.
    fn link(&mut self) -> Result<(), SolveError> {
        let Some(mut reverse) = self.reverse.take() else {
            return Ok(());
        };
        reverse.seal(&self.budget)?;
        (0..self.size).into_par_iter().try_for_each(|position| {
            match self.counters[position as usize].load(Ordering::Relaxed) {
                0 | ILLEGAL => return Ok(()),
                _ => {}
            }
            let at = TierPosition::new(self.tier, position);
            for child in self.api.canonical_child_positions(at) {
                if !reverse.add(child, position) {
                    return Err(SolveError::UnknownChildTier(at, child.tier));
                }
            }
            Ok(())
        })?;
        log::debug!(
            "{:<32}{:<32}",
            format!("reverse     tier {}", self.api.tier_name(self.tier)),
            format!("{} edges", reverse.edges())
        );
        self.reverse = Some(reverse);
        Ok(())
    }

    /// Spread one frontier bucket to the parents of its positions.
    fn propagate(&self, class: Value, remoteness: Remoteness) -> Result<(), SolveError> {
        let bucket = self.frontier(class).take(remoteness);
        if bucket.is_empty() {
            return Ok(());
        }
        let ref bucket = bucket;
        bucket
            .positions
            .par_iter()
            .enumerate()
            .try_for_each(|(i, &position)| {
                let child = TierPosition::new(self.source(bucket.source(i)), position);
                self.spread(class, remoteness + 1, child)
            })
    }

    /// Which outcome classes appear at which remoteness, per child tier.
    fn census(&mut self) -> Result<Vec<Vec<u8>>, SolveError> {
        let mut levels = Vec::with_capacity(self.children.len());
        for child in self.children.clone() {
            let canonical = self.api.canonical_tier(child);
            self.db.load_tier(canonical, self.api.tier_size(canonical))?;
            let ref flags = (0..FRONTIER_SIZE)
                .map(|_| AtomicU8::new(0))
                .collect::<Vec<_>>();
            self.visit(child, |_, outcome| {
                if let Some(flag) = flags.get(outcome.remoteness as usize) {
                    flag.fetch_or(Self::flag(outcome.value), Ordering::Relaxed);
                }
                Ok(())
            })?;
            self.db.unload_tier(canonical);
            levels.push(flags.iter().map(|f| f.load(Ordering::Relaxed)).collect());
        }
        Ok(levels)
    }

    /// Spread every position of `class` at `remoteness`, child tiers first.
    fn sweep(&mut self, class: Value, remoteness: Remoteness, levels: &[Vec<u8>]) -> Result<(), SolveError> {
        let next = remoteness + 1;
        let wanted = |outcome: Outcome| outcome.value == class && outcome.remoteness == remoteness;
        for (source, child) in self.children.clone().into_iter().enumerate() {
            if levels[source][remoteness as usize] & Self::flag(class) == 0 {
                continue;
            }
            let canonical = self.api.canonical_tier(child);
            self.db.load_tier(canonical, self.api.tier_size(canonical))?;
            self.visit(child, |at, outcome| match wanted(outcome) {
                true => self.spread(class, next, at),
                false => Ok(()),
            })?;
            self.db.unload_tier(canonical);
        }
        (0..self.size).into_par_iter().try_for_each(|position| {
            match wanted(self.db.get(position)) {
                true => self.spread(class, next, TierPosition::new(self.tier, position)),
                false => Ok(()),
            }
        })
    }

    /// Positions still waiting on children can never be forced: draws.
    fn residue(&self) {
        (0..self.size).into_par_iter().for_each(|position| {
            match self.counters[position as usize].load(Ordering::Relaxed) {
                0 | ILLEGAL => {}
                _ => self.db.set(position, Outcome::new(Value::Draw, 0)),
            }
        })
    }
}

// helpers
impl Induction<'_> {
    /// Index of the solving tier among frontier sources.
    fn own(&self) -> usize {
        self.children.len()
    }
    /// Records, counters and the largest child tier.
    fn base(&self) -> usize {
        let largest = self
            .children
            .iter()
            .map(|&c| self.api.tier_size(self.api.canonical_tier(c)))
            .max()
            .unwrap_or(0);
        self.db.usage_of(self.size)
            + self.size as usize * std::mem::size_of::<AtomicU32>()
            + self.db.usage_of(largest)
    }
    /// Empty frontiers and, without game-listed parents, reverse-graph slots.
    fn overhead(&self) -> usize {
        let frontiers = 3 * Frontier::usage(self.own() + 1);
        match self.api.has_retrograde() {
            true => frontiers,
            false => frontiers + ReverseGraph::usage(self.slots().iter().map(|&(_, s)| s as usize).sum()),
        }
    }
    /// Every tier a child position may live in, with its size.
    fn slots(&self) -> Vec<(Tier, u64)> {
        std::iter::once(self.tier)
            .chain(self.children.iter().copied())
            .map(|t| (t, self.api.tier_size(t)))
            .collect()
    }
    fn flag(value: Value) -> u8 {
        match value {
            Value::Win => 1,
            Value::Lose => 2,
            Value::Tie => 4,
            Value::Draw | Value::Undecided => 0,
        }
    }
    fn slot(value: Value) -> usize {
        match value {
            Value::Win => 0,
            Value::Lose => 1,
            _ => 2,
        }
    }
    fn depth(&self, class: Value) -> Remoteness {
        self.deepest[Self::slot(class)].load(Ordering::Relaxed)
    }
    fn frontier(&self, class: Value) -> &Frontier {
        &self.frontiers[Self::slot(class)]
    }
    fn source(&self, index: usize) -> Tier {
        self.children.get(index).copied().unwrap_or(self.tier)
    }
    /// Call `f` on every legal canonical position of `child` with its
    /// outcome. The canonical tier of `child` must be loaded.
    fn visit<F>(&self, child: Tier, f: F) -> Result<(), SolveError>
    where
        F: Fn(TierPosition, Outcome) -> Result<(), SolveError> + Sync + Send,
    {
        (0..self.api.tier_size(child))
            .into_par_iter()
            .try_for_each(|position| {
                let at = TierPosition::new(child, position);
                if !self.api.is_legal(at) || !self.api.is_canonical_position(at) {
                    return Ok(());
                }
                f(at, self.db.get_from_loaded(self.api.canonical(at)))
            })
    }
    fn parents(&self, child: TierPosition) -> Vec<Position> {
        match self.reverse {
            Some(ref reverse) => reverse.pop_parents_of(child),
            None => self
                .api
                .canonical_parent_positions(child, self.tier)
                .unwrap_or_default(),
        }
    }
    /// Apply a decided child of `class` to each of its parents.
    fn spread(&self, class: Value, next: Remoteness, child: TierPosition) -> Result<(), SolveError> {
        for parent in self.parents(child) {
            match class {
                Value::Lose if self.claim(parent) => self.decide(parent, Outcome::new(Value::Win, next))?,
                Value::Win if self.decrement(parent) => self.decide(parent, Outcome::new(Value::Lose, next))?,
                Value::Tie if self.claim(parent) => self.decide(parent, Outcome::new(Value::Tie, next))?,
                _ => {}
            }
        }
        Ok(())
    }
    fn enqueue(&self, at: TierPosition, outcome: Outcome, source: usize) -> Result<(), SolveError> {
        match outcome.value {
            Value::Win | Value::Lose | Value::Tie if !self.frontiers.is_empty() => {
                self.frontier(outcome.value)
                    .push(at, outcome.remoteness, source)
            }
            _ => Ok(()),
        }
    }
    fn decide(&self, parent: Position, outcome: Outcome) -> Result<(), SolveError> {
        let at = TierPosition::new(self.tier, parent);
        if outcome.remoteness > REMOTENESS_MAX {
            return Err(SolveError::RemotenessOverflow(at));
        }
        self.db.set(parent, outcome);
        self.deepest[Self::slot(outcome.value)].fetch_max(outcome.remoteness, Ordering::Relaxed);
        self.enqueue(at, outcome, self.own())
    }
    fn counter(&self, parent: Position) -> Option<&AtomicU32> {
        self.counters.get(parent as usize)
    }
    /// Take an undecided parent for this child. Only one claimant succeeds.
    fn claim(&self, parent: Position) -> bool {
        self.counter(parent).is_some_and(|counter| {
            counter
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n != 0 && n != ILLEGAL).then_some(0)
                })
                .is_ok()
        })
    }
    /// Count one more winning child. True for the call that exhausts the parent.
    fn decrement(&self, parent: Position) -> bool {
        self.counter(parent).is_some_and(|counter| {
            counter
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n != 0 && n != ILLEGAL).then(|| n - 1)
                })
                .is_ok_and(|previous| previous == 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::database::Records;
    use crate::game::TierType;
    use crate::games::ExplicitGame;
    use crate::games::TicTacToe;

    fn solve(api: &Api, store: &Arc<MemoryStore>, tier: Tier) -> Result<(), SolveError> {
        Induction::new(api, store.clone(), tier, usize::MAX).solve()
    }

    fn stored(store: &MemoryStore, tier: Tier, position: Position) -> (Value, Remoteness) {
        let outcome = store.probe(TierPosition::new(tier, position)).unwrap();
        (outcome.value, outcome.remoteness)
    }

    /// 0 <-> 1 -> 2 (lose), and a pure cycle 3 <-> 4.
    fn loopy(retrograde: bool) -> Api {
        let builder = ExplicitGame::builder()
            .tier(0, 6, TierType::Loopy)
            .edge((0, 0), (0, 1))
            .edge((0, 1), (0, 0))
            .edge((0, 1), (0, 2))
            .primitive((0, 2), Value::Lose)
            .edge((0, 3), (0, 4))
            .edge((0, 4), (0, 3))
            .illegal((0, 5))
            .initial((0, 0));
        match retrograde {
            true => Api::new(builder.retrograde().build()),
            false => Api::new(builder.build()),
        }
    }

    /// Tier 1 of `size` positions, each moving to its twin in tier 0 and
    /// around a ring inside tier 1. Every third tier-0 position loses.
    fn ring(size: u64, retrograde: bool) -> Api {
        let mut builder = ExplicitGame::builder()
            .tier(0, size, TierType::Loopy)
            .tier(1, size, TierType::Loopy)
            .initial((1, 0));
        for p in 0..size {
            builder = match p % 3 {
                0 => builder.primitive((0, p), Value::Lose),
                1 => builder.primitive((0, p), Value::Win),
                _ => builder.primitive((0, p), Value::Tie),
            };
            builder = builder.edge((1, p), (0, p)).edge((1, p), (1, (p + 1) % size));
        }
        match retrograde {
            true => Api::new(builder.retrograde().build()),
            false => Api::new(builder.build()),
        }
    }

    fn outcomes(store: &MemoryStore, tier: Tier, size: u64) -> Vec<(Value, Remoteness)> {
        (0..size).map(|p| stored(store, tier, p)).collect()
    }

    #[test]
    fn loopy_tier_with_reverse_graph() {
        let ref store = Arc::new(MemoryStore::new());
        solve(&loopy(false), store, 0).unwrap();
        assert!(stored(store, 0, 2) == (Value::Lose, 0));
        assert!(stored(store, 0, 1) == (Value::Win, 1));
        assert!(stored(store, 0, 0) == (Value::Lose, 2));
        assert!(stored(store, 0, 3) == (Value::Draw, 0));
        assert!(stored(store, 0, 4) == (Value::Draw, 0));
        assert!(stored(store, 0, 5) == (Value::Undecided, 0));
    }

    #[test]
    fn loopy_tier_with_retrograde_parents() {
        let ref store = Arc::new(MemoryStore::new());
        solve(&loopy(true), store, 0).unwrap();
        assert!(stored(store, 0, 0) == (Value::Lose, 2));
        assert!(stored(store, 0, 1) == (Value::Win, 1));
        assert!(stored(store, 0, 3) == (Value::Draw, 0));
    }

    #[test]
    fn ties_yield_to_wins_and_beat_draws() {
        // 0 -> {1 (tie), 2 (win in 0)} ; 3 -> {1 (tie), 4 <-> 3 cycle}
        let api = Api::new(
            ExplicitGame::builder()
                .tier(0, 5, TierType::Loopy)
                .primitive((0, 1), Value::Tie)
                .primitive((0, 2), Value::Lose)
                .edge((0, 0), (0, 1))
                .edge((0, 0), (0, 2))
                .edge((0, 3), (0, 1))
                .edge((0, 3), (0, 4))
                .edge((0, 4), (0, 3))
                .initial((0, 0))
                .build(),
        );
        let ref store = Arc::new(MemoryStore::new());
        solve(&api, store, 0).unwrap();
        assert!(stored(store, 0, 0) == (Value::Win, 1));
        assert!(stored(store, 0, 3) == (Value::Tie, 1));
        assert!(stored(store, 0, 4) == (Value::Tie, 2));
    }

    #[test]
    fn child_tiers_feed_the_frontier() {
        // tier 1 positions move into tier 0 and around a cycle inside tier 1
        let api = Api::new(
            ExplicitGame::builder()
                .tier(0, 2, TierType::Loopy)
                .tier(1, 3, TierType::Loopy)
                .primitive((0, 0), Value::Win)
                .primitive((0, 1), Value::Draw)
                .edge((1, 0), (0, 0))
                .edge((1, 1), (1, 0))
                .edge((1, 1), (0, 1))
                .edge((1, 2), (1, 1))
                .edge((1, 2), (1, 0))
                .initial((1, 2))
                .build(),
        );
        let ref store = Arc::new(MemoryStore::new());
        solve(&api, store, 0).unwrap();
        solve(&api, store, 1).unwrap();
        assert!(stored(store, 0, 1) == (Value::Draw, 0));
        assert!(stored(store, 1, 0) == (Value::Lose, 1));
        assert!(stored(store, 1, 1) == (Value::Win, 2));
        assert!(stored(store, 1, 2) == (Value::Win, 2));
    }

    #[test]
    fn missing_child_tier_fails_without_commit() {
        let api = Api::new(
            ExplicitGame::builder()
                .tier(0, 1, TierType::Loopy)
                .tier(1, 1, TierType::Loopy)
                .primitive((0, 0), Value::Lose)
                .edge((1, 0), (0, 0))
                .initial((1, 0))
                .build(),
        );
        let ref store = Arc::new(MemoryStore::new());
        let error = solve(&api, store, 1).unwrap_err();
        assert!(error.is_resource());
        assert!(store.status(1) == crate::database::Status::Missing);
    }

    #[test]
    fn reverse_graph_counts_against_the_budget() {
        // records and counters fit, the reverse graph over both tiers does not
        let size = 10_000;
        let ref api = ring(size, false);
        let ref store = Arc::new(MemoryStore::new());
        solve(api, store, 0).unwrap();
        let memory = Records::usage(size) * 2 + 4 * size as usize;
        let error = Induction::new(api, store.clone(), 1, memory)
            .solve()
            .unwrap_err();
        assert!(matches!(error, SolveError::InsufficientMemory { tier: 1, .. }));
        assert!(error.is_resource());
        assert!(store.status(1) == crate::database::Status::Missing);
    }

    #[test]
    fn frontiers_give_way_to_rescans_when_memory_is_short() {
        let size = 60;
        let ref store = Arc::new(MemoryStore::new());
        let ref reference = Arc::new(MemoryStore::new());
        let ref api = ring(size, true);
        solve(api, store, 0).unwrap();
        solve(api, reference, 0).unwrap();
        solve(api, reference, 1).unwrap();
        let memory = Records::usage(size) * 2 + 4 * size as usize;
        Induction::new(api, store.clone(), 1, memory).solve().unwrap();
        assert!(outcomes(store, 1, size) == outcomes(reference, 1, size));
        assert!(stored(store, 1, 0) == (Value::Win, 1));
        assert!(stored(store, 1, 1) == (Value::Tie, 2));
        assert!(stored(store, 1, 2) == (Value::Tie, 1));
    }

    #[test]
    fn frontierless_matches_frontiers() {
        for retrograde in [false, true] {
            let ref api = loopy(retrograde);
            let ref store = Arc::new(MemoryStore::new());
            let result = Induction::new(api, store.clone(), 0, usize::MAX)
                .strategy(Strategy::Frontierless)
                .solve();
            match retrograde {
                false => assert!(matches!(result, Err(SolveError::NoParents(0)))),
                true => {
                    result.unwrap();
                    assert!(stored(store, 0, 0) == (Value::Lose, 2));
                    assert!(stored(store, 0, 1) == (Value::Win, 1));
                    assert!(stored(store, 0, 2) == (Value::Lose, 0));
                    assert!(stored(store, 0, 3) == (Value::Draw, 0));
                    assert!(stored(store, 0, 5) == (Value::Undecided, 0));
                }
            }
        }
        let ref api = ring(30, true);
        let ref frontier = Arc::new(MemoryStore::new());
        let ref frontierless = Arc::new(MemoryStore::new());
        for tier in 0..2 {
            Induction::new(api, frontier.clone(), tier, usize::MAX)
                .strategy(Strategy::Frontier)
                .solve()
                .unwrap();
            Induction::new(api, frontierless.clone(), tier, usize::MAX)
                .strategy(Strategy::Frontierless)
                .solve()
                .unwrap();
        }
        assert!(outcomes(frontier, 1, 30) == outcomes(frontierless, 1, 30));
    }

    #[test]
    fn frontierless_tictactoe_agrees() {
        let ref api = Api::new(TicTacToe::new().loopy().with_retrograde());
        let ref frontier = Arc::new(MemoryStore::new());
        let ref frontierless = Arc::new(MemoryStore::new());
        for tier in (0..=9).rev() {
            Induction::new(api, frontier.clone(), tier, usize::MAX)
                .solve()
                .unwrap();
            Induction::new(api, frontierless.clone(), tier, usize::MAX)
                .strategy(Strategy::Frontierless)
                .solve()
                .unwrap();
        }
        for tier in 0..=9 {
            let size = api.tier_size(tier);
            assert!(outcomes(frontier, tier, size) == outcomes(frontierless, tier, size));
        }
        assert!(stored(frontierless, 0, 0) == (Value::Tie, 9));
    }
}
