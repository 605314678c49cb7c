use super::*;
use crate::Tier;
use crate::error::StoreError;
use crate::game::Outcome;
use crate::game::TierPosition;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// Solved tiers kept in process memory. Used by tests and small games.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tiers: RwLock<HashMap<Tier, Arc<Vec<u16>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn tiers(&self) -> Vec<Tier> {
        let mut tiers = self.read().keys().copied().collect::<Vec<_>>();
        tiers.sort_unstable();
        tiers
    }
    pub fn remove(&self, tier: Tier) {
        self.write().remove(&tier);
    }
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Tier, Arc<Vec<u16>>>> {
        self.tiers.read().unwrap_or_else(|poison| poison.into_inner())
    }
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Tier, Arc<Vec<u16>>>> {
        self.tiers.write().unwrap_or_else(|poison| poison.into_inner())
    }
    fn get(&self, tier: Tier) -> Result<Arc<Vec<u16>>, StoreError> {
        self.read().get(&tier).cloned().ok_or(StoreError::Missing(tier))
    }
}

impl Store for MemoryStore {
    fn status(&self, tier: Tier) -> Status {
        match self.read().contains_key(&tier) {
            true => Status::Solved,
            false => Status::Missing,
        }
    }
    fn save(&self, tier: Tier, records: &Records) -> Result<(), StoreError> {
        let raw = records.raw().collect::<Vec<_>>();
        self.write().insert(tier, Arc::new(raw));
        Ok(())
    }
    fn load(&self, tier: Tier, size: u64) -> Result<Records, StoreError> {
        let raw = self.get(tier)?;
        match raw.len() as u64 == size {
            true => Ok(Records::from(raw.as_ref().clone())),
            false => Err(StoreError::Corrupt {
                tier,
                reason: format!("expected {} records, found {}", size, raw.len()),
            }),
        }
    }
    fn probe(&self, at: TierPosition) -> Result<Outcome, StoreError> {
        let raw = self.get(at.tier)?;
        raw.get(at.position as usize)
            .map(|&r| Records::unpack(r))
            .ok_or(StoreError::OutOfRange {
                at,
                size: raw.len() as u64,
            })
    }
}
