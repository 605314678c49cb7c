//! Error taxonomy.
//!
//! Tier-graph errors abort a run. Solve errors fail a single tier and leave
//! its ancestors blocked. Check errors come from the consistency checker.
use crate::Position;
use crate::Tier;
use crate::game::Outcome;
use crate::game::TierPosition;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("tier graph has a cycle: tier {parent} reaches tier {child}, which is still being explored")]
    Cycle { parent: String, child: String },
    #[error("tier {parent} lists child tier {child} more than once")]
    DuplicateChild { parent: String, child: String },
    #[error("dependency counter of tier {0} would drop below zero")]
    Underflow(Tier),
    #[error("tier graph has no tier without children")]
    NoPrimitiveTier,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tier {tier} is corrupted: {reason}")]
    Corrupt { tier: Tier, reason: String },
    #[error("tier {0} has not been solved")]
    Missing(Tier),
    #[error("position {} out of range for tier {} of size {size}", .at.position, .at.tier)]
    OutOfRange { at: TierPosition, size: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("out of memory allocating {0} bytes")]
    OutOfMemory(usize),
    #[error("tier {tier} needs {needed} bytes but only {available} are available")]
    InsufficientMemory {
        tier: Tier,
        needed: usize,
        available: usize,
    },
    #[error("storage: {0}")]
    Store(#[from] StoreError),
    #[error("could not start worker threads: {0}")]
    ThreadPool(String),
    #[error("non-primitive position {0} has no children")]
    NoChildren(TierPosition),
    #[error("position {0} has a child in tier {1}, which is not a child tier")]
    UnknownChildTier(TierPosition, Tier),
    #[error("tier {tier} has {count} child tiers, more than the supported maximum")]
    TooManyChildren { tier: Tier, count: usize },
    #[error("remoteness of {0} exceeds the maximum")]
    RemotenessOverflow(TierPosition),
    #[error("legal position {0} was left undecided although all its children are solved")]
    IllegalChildValue(TierPosition),
    #[error("tier {0} cannot be solved without frontiers: the game does not list parents")]
    NoParents(Tier),
}

impl SolveError {
    /// Resource failures are about the machine, not about the game.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Self::OutOfMemory(_)
                | Self::InsufficientMemory { .. }
                | Self::Store(_)
                | Self::ThreadPool(_)
        )
    }
    /// The solve ran past its memory budget, up front or while running.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory(_) | Self::InsufficientMemory { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("{parent} has an illegal child {child}")]
    IllegalChild {
        parent: TierPosition,
        child: TierPosition,
    },
    #[error("{parent} is not among the parents of its child {child}")]
    ChildParentMismatch {
        parent: TierPosition,
        child: TierPosition,
    },
    #[error("{parent} is reported as a parent of {child}, but is not its parent")]
    ParentChildMismatch {
        parent: TierPosition,
        child: TierPosition,
    },
    #[error("{at} maps to position {image} in its own tier")]
    SymmetrySelfMapping { at: TierPosition, image: Position },
    #[error("{at} maps to {image} in the canonical tier, which maps back to {back}")]
    SymmetryInconsistent {
        at: TierPosition,
        image: TierPosition,
        back: Position,
    },
    #[error("canonical {at} maps to non-canonical {image}")]
    NonCanonicalImage { at: TierPosition, image: TierPosition },
    #[error("{at} is stored as {found} but the reference has {expected}")]
    Mismatch {
        at: TierPosition,
        expected: Outcome,
        found: Outcome,
    },
}

/// Any failure surfaced by the solver facade.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_classification() {
        assert!(SolveError::OutOfMemory(8).is_resource());
        assert!(SolveError::Store(StoreError::Missing(3)).is_resource());
        assert!(!SolveError::NoChildren(TierPosition::new(1, 2)).is_resource());
        assert!(!SolveError::RemotenessOverflow(TierPosition::new(0, 0)).is_resource());
        assert!(!SolveError::NoParents(0).is_resource());
        assert!(SolveError::OutOfMemory(8).is_memory());
        assert!(!SolveError::Store(StoreError::Missing(3)).is_memory());
    }

    #[test]
    fn cycle_message_names_both_tiers() {
        let error = GraphError::Cycle {
            parent: "alpha".into(),
            child: "beta".into(),
        };
        let message = error.to_string();
        assert!(message.contains("alpha"));
        assert!(message.contains("beta"));
    }
}
