use super::*;
use crate::Tier;
use crate::database::Status;
use crate::database::Store;
use crate::error::CheckError;
use crate::error::SolveError;
use crate::game::Api;
use crate::game::TierType;
use crate::solver::Options;
use rand::rngs::SmallRng;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// Which per-tier algorithm to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Immediate transition where the game allows it, backward induction elsewhere.
    #[default]
    Auto,
    /// Backward induction everywhere.
    Induction,
    /// Value iteration everywhere.
    ValueIteration,
}

/// How a dispatched tier was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solved {
    Solved,
    /// Already in the store and not forced.
    Loaded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub solved: usize,
    pub loaded: usize,
    pub failed: usize,
    pub seconds: f64,
}

/// Solves one tier at a time on its own thread pool.
pub struct Worker {
    api: Api,
    store: Arc<dyn Store>,
    memory: usize,
    method: Method,
    pool: rayon::ThreadPool,
    solved: AtomicUsize,
    loaded: AtomicUsize,
    failed: AtomicUsize,
    start: Instant,
}

impl Worker {
    pub fn new(api: Api, store: Arc<dyn Store>, options: &Options) -> Result<Self, SolveError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|i| format!("tier-worker-{}", i))
            .build()
            .map_err(|e| SolveError::ThreadPool(e.to_string()))?;
        Ok(Self {
            api,
            store,
            memory: options.memory,
            method: options.method,
            pool,
            solved: AtomicUsize::new(0),
            loaded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            start: Instant::now(),
        })
    }
    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            solved: self.solved.load(Ordering::Relaxed),
            loaded: self.loaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            seconds: self.start.elapsed().as_secs_f64(),
        }
    }
}

// solving
impl Worker {
    /// Solve `tier` unless the store already has it and `force` is unset.
    /// A failed solve leaves nothing in the store.
    pub fn solve(&self, tier: Tier, force: bool) -> Result<Solved, SolveError> {
        let ref name = self.api.tier_name(tier);
        if !force && self.store.status(tier) == Status::Solved {
            log::debug!("{:<32}{:<32}", "loaded      tier", name);
            self.loaded.fetch_add(1, Ordering::Relaxed);
            return Ok(Solved::Loaded);
        }
        let start = Instant::now();
        let store = self.store.clone();
        let result = self.pool.install(|| match (self.method, self.api.tier_type(tier)) {
            (Method::Auto, TierType::ImmediateTransition) => {
                Immediate::new(&self.api, store, tier, self.memory).solve()
            }
            (Method::ValueIteration, _) => Iteration::new(&self.api, store, tier, self.memory).solve(),
            _ => Induction::new(&self.api, store, tier, self.memory).solve(),
        });
        match result {
            Ok(()) => {
                log::info!(
                    "{:<32}{:<32}",
                    format!("solved      tier {}", name),
                    format!("{:.2?}", start.elapsed())
                );
                self.solved.fetch_add(1, Ordering::Relaxed);
                Ok(Solved::Solved)
            }
            Err(e) => {
                log::error!("{:<32}{}", format!("failed      tier {}", name), e);
                self.failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Run the consistency checks on `tier`.
    pub fn check(&self, tier: Tier, parents: Vec<Tier>, rng: &mut SmallRng) -> Result<usize, CheckError> {
        self.pool
            .install(|| Checker::new(&self.api, tier, parents).check(rng))
    }
}
