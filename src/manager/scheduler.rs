use super::*;
use crate::SOLVING_LOG_INTERVAL;
use crate::Tier;
use crate::error::GraphError;
use crate::game::Api;
use crate::graph::TierGraph;
use crate::worker::Solved;
use crate::worker::Worker;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::time::Instant;

/// Tier-level bookkeeping shared by local and distributed dispatch.
///
/// Tiers whose dependencies are all settled wait in a FIFO queue. Handing a
/// tier out moves it to the running set; reporting it back either releases
/// its parents or records the failure, which leaves its ancestors blocked.
pub struct Scheduler {
    api: Api,
    graph: TierGraph,
    queue: VecDeque<Tier>,
    running: HashSet<Tier>,
    summary: Summary,
    start: Instant,
    checked: Instant,
}

impl Scheduler {
    pub fn new(api: Api, graph: TierGraph) -> Result<Self, GraphError> {
        let queue = VecDeque::from(graph.ready());
        if queue.is_empty() {
            return Err(GraphError::NoPrimitiveTier);
        }
        Ok(Self {
            api,
            graph,
            queue,
            running: HashSet::new(),
            summary: Summary::default(),
            start: Instant::now(),
            checked: Instant::now(),
        })
    }

    /// Next canonical tier to solve. Non-canonical tiers are skipped on the way.
    /// Nothing is handed out once an interrupt was requested.
    pub fn next(&mut self) -> Option<Tier> {
        if crate::interrupted() {
            return None;
        }
        while let Some(tier) = self.queue.pop_front() {
            if self.api.is_canonical_tier(tier) {
                self.running.insert(tier);
                return Some(tier);
            }
            log::debug!("{:<32}{:<32}", "skipped     tier", self.api.tier_name(tier));
            self.summary.skipped += 1;
        }
        None
    }

    pub fn complete(&mut self, tier: Tier, solved: Solved) -> Result<(), GraphError> {
        self.running.remove(&tier);
        match solved {
            Solved::Solved => self.summary.solved += 1,
            Solved::Loaded => self.summary.loaded += 1,
        }
        self.queue.extend(self.graph.release(&self.api, tier)?);
        self.progress();
        Ok(())
    }

    pub fn fail(&mut self, tier: Tier, reason: impl ToString) {
        self.running.remove(&tier);
        self.summary.failed += 1;
        self.summary.failures.push((tier, reason.to_string()));
    }

    /// Whether some dispatched tier has not been reported yet.
    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let settled = self.summary.solved + self.summary.loaded + self.summary.failed;
        Summary {
            blocked: self
                .graph
                .stats()
                .canonical
                .saturating_sub(settled + self.running.len()),
            seconds: self.start.elapsed().as_secs_f64(),
            ..self.summary.clone()
        }
    }

    /// Solve everything on the calling thread, one tier at a time.
    pub fn run(&mut self, worker: &Worker, force: bool) -> Result<Summary, GraphError> {
        while let Some(tier) = self.next() {
            match worker.solve(tier, force) {
                Ok(solved) => self.complete(tier, solved)?,
                Err(e) => self.fail(tier, e),
            }
        }
        Ok(self.summary())
    }

    fn progress(&mut self) {
        if self.checked.elapsed() >= SOLVING_LOG_INTERVAL {
            self.checked = Instant::now();
            log::info!(
                "{:<32}{:<32}",
                "tiers settled",
                format!(
                    "{} / {}",
                    self.summary.solved + self.summary.loaded,
                    self.graph.stats().canonical
                )
            );
        }
    }
}
