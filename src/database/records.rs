use crate::Position;
use crate::REMOTENESS_MAX;
use crate::error::SolveError;
use crate::game::Outcome;
use crate::game::Value;
use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering;

/// Bits reserved for remoteness in a packed record.
const REMOTENESS_BITS: u16 = 10;

/// Solved outcomes of one tier, one packed `u16` per position.
///
/// Writes go through atomics so that disjoint positions can be set from
/// a parallel scan without locking.
#[derive(Debug)]
pub struct Records(Vec<AtomicU16>);

impl Records {
    /// Allocate `size` undecided records, failing softly if memory runs out.
    pub fn new(size: u64) -> Result<Self, SolveError> {
        let n = size as usize;
        let mut records = Vec::new();
        records
            .try_reserve_exact(n)
            .map_err(|_| SolveError::OutOfMemory(Self::usage(size)))?;
        records.extend((0..n).map(|_| AtomicU16::new(0)));
        Ok(Self(records))
    }
    /// Bytes needed to hold a tier of `size` positions.
    pub fn usage(size: u64) -> usize {
        size as usize * std::mem::size_of::<AtomicU16>()
    }
    pub fn len(&self) -> u64 {
        self.0.len() as u64
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, position: Position) -> Outcome {
        Self::unpack(self.0[position as usize].load(Ordering::Relaxed))
    }
    pub fn set(&self, position: Position, outcome: Outcome) {
        self.0[position as usize].store(Self::pack(outcome), Ordering::Relaxed);
    }
    /// Packed records in position order.
    pub fn raw(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().map(|r| r.load(Ordering::Relaxed))
    }

    pub fn pack(outcome: Outcome) -> u16 {
        debug_assert!(outcome.remoteness <= REMOTENESS_MAX);
        (outcome.value as u16) << REMOTENESS_BITS | outcome.remoteness
    }
    pub fn unpack(raw: u16) -> Outcome {
        let value = Value::try_from((raw >> REMOTENESS_BITS) as u8).unwrap_or_default();
        Outcome::new(value, raw & REMOTENESS_MAX)
    }
    /// Whether a packed record decodes to a known value.
    pub fn is_valid(raw: u16) -> bool {
        Value::try_from((raw >> REMOTENESS_BITS) as u8).is_ok()
    }
}

impl From<Vec<u16>> for Records {
    fn from(raw: Vec<u16>) -> Self {
        Self(raw.into_iter().map(AtomicU16::new).collect())
    }
}
