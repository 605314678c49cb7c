use crate::Tier;
use crate::worker::WorkerStats;

/// Worker to manager. Every request but `Farewell` gets exactly one `Command` back.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Idle and asking for work.
    Check,
    ReportSolved(Tier),
    ReportLoaded(Tier),
    ReportError(Tier, String),
    /// Last message of a worker after `Terminate`.
    Farewell(WorkerStats),
}

/// Manager to worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Solve { tier: Tier, force: bool },
    /// Nothing ready yet but tiers are still running elsewhere.
    Sleep,
    Terminate,
}

/// A request tagged with the worker it came from.
#[derive(Debug)]
pub struct Envelope {
    pub worker: usize,
    pub request: Request,
}
