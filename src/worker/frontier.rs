use super::Budget;
use crate::FRONTIER_SIZE;
use crate::Position;
use crate::Remoteness;
use crate::error::SolveError;
use crate::game::TierPosition;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

const ENTRY: usize = std::mem::size_of::<Position>();

/// Positions of one outcome class awaiting propagation, bucketed by remoteness.
///
/// Each bucket also counts how many entries every source tier contributed.
/// Sources fill the frontier one after another, so after [`Frontier::accumulate`]
/// the running totals ("dividers") recover each entry's source by binary search.
/// The solving tier is always the last source; entries it adds later extend
/// the final divider and keep the grouping intact.
///
/// Bucket capacity is charged to the solve's [`Budget`] as buckets grow and
/// refunded when a bucket is taken.
#[derive(Debug)]
pub struct Frontier {
    buckets: Vec<Mutex<Vec<Position>>>,
    dividers: Vec<Vec<AtomicUsize>>,
    budget: Arc<Budget>,
}

/// A detached bucket: its positions and the cumulative source dividers.
#[derive(Debug, Default)]
pub struct Bucket {
    pub positions: Vec<Position>,
    pub dividers: Vec<usize>,
}

impl Bucket {
    /// Index of the source that contributed the `i`th entry.
    pub fn source(&self, i: usize) -> usize {
        self.dividers.partition_point(|&d| d <= i)
    }
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl Frontier {
    /// Fixed bytes of an empty frontier with `sources` sources.
    pub fn usage(sources: usize) -> usize {
        FRONTIER_SIZE
            * (std::mem::size_of::<Mutex<Vec<Position>>>()
                + std::mem::size_of::<Vec<AtomicUsize>>()
                + sources * std::mem::size_of::<AtomicUsize>())
    }

    pub fn new(sources: usize, budget: Arc<Budget>) -> Result<Self, SolveError> {
        budget.charge(Self::usage(sources))?;
        Ok(Self {
            buckets: (0..FRONTIER_SIZE).map(|_| Mutex::new(Vec::new())).collect(),
            dividers: (0..FRONTIER_SIZE)
                .map(|_| (0..sources).map(|_| AtomicUsize::new(0)).collect())
                .collect(),
            budget,
        })
    }

    /// Queue `at` at `remoteness`. Fails if the remoteness does not fit in
    /// the frontier or the bucket cannot grow within the budget.
    pub fn push(&self, at: TierPosition, remoteness: Remoteness, source: usize) -> Result<(), SolveError> {
        let r = remoteness as usize;
        if r >= FRONTIER_SIZE {
            return Err(SolveError::RemotenessOverflow(at));
        }
        let mut bucket = self.buckets[r]
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if bucket.len() == bucket.capacity() {
            let grow = bucket.capacity().max(8);
            self.budget.charge(grow * ENTRY)?;
            bucket
                .try_reserve_exact(grow)
                .map_err(|_| SolveError::OutOfMemory(grow * ENTRY))?;
        }
        bucket.push(at.position);
        drop(bucket);
        self.dividers[r][source].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
    /// Turn per-source counts into running totals.
    pub fn accumulate(&mut self) {
        for dividers in self.dividers.iter_mut() {
            let mut total = 0;
            for divider in dividers.iter_mut() {
                total += *divider.get_mut();
                *divider.get_mut() = total;
            }
        }
    }
    /// Detach bucket `remoteness`, releasing its memory from the frontier.
    pub fn take(&self, remoteness: Remoteness) -> Bucket {
        let r = remoteness as usize;
        let positions = std::mem::take(
            &mut *self.buckets[r]
                .lock()
                .unwrap_or_else(|poison| poison.into_inner()),
        );
        self.budget.refund(positions.capacity() * ENTRY);
        let dividers = self.dividers[r]
            .iter()
            .map(|d| d.swap(0, Ordering::Relaxed))
            .collect();
        Bucket {
            positions,
            dividers,
        }
    }
    pub fn len(&self, remoteness: Remoteness) -> usize {
        self.buckets[remoteness as usize]
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }
}
