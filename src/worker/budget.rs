use crate::error::SolveError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Bytes one tier solve may hold at once.
///
/// Fixed allocations are charged up front; structures that grow while
/// the solve runs (reverse-graph edges, frontier entries) charge as they
/// grow and hand bytes back as they shrink. A charge that would cross the
/// limit fails instead of allocating.
#[derive(Debug)]
pub struct Budget {
    limit: usize,
    used: AtomicUsize,
}

impl Budget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }
    pub fn limit(&self) -> usize {
        self.limit
    }
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used())
    }
    pub fn charge(&self, bytes: usize) -> Result<(), SolveError> {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= self.limit)
            })
            .map(|_| ())
            .map_err(|_| SolveError::OutOfMemory(bytes))
    }
    pub fn refund(&self, bytes: usize) {
        let _ = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(bytes))
            });
    }
    /// Return everything charged so far.
    pub fn reset(&self) {
        self.used.store(0, Ordering::Release);
    }
}
