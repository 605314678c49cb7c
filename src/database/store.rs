use super::*;
use crate::Tier;
use crate::error::StoreError;
use crate::game::Outcome;
use crate::game::TierPosition;

/// Persistence state of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Solved,
    Missing,
    Corrupted,
}

/// Where solved tiers live between solves.
///
/// `save` is all-or-nothing: after a failed save the tier reads as
/// missing, never as partially written.
pub trait Store: Send + Sync {
    fn status(&self, tier: Tier) -> Status;
    fn save(&self, tier: Tier, records: &Records) -> Result<(), StoreError>;
    fn load(&self, tier: Tier, size: u64) -> Result<Records, StoreError>;
    /// Outcome of a single stored position.
    fn probe(&self, at: TierPosition) -> Result<Outcome, StoreError>;
    /// Memory a loaded tier of `size` positions occupies.
    fn usage(&self, size: u64) -> usize {
        Records::usage(size)
    }
}
