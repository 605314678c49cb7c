use super::*;
use crate::Position;
use crate::Tier;
use crate::error::SolveError;
use crate::error::StoreError;
use crate::game::Outcome;
use crate::game::TierPosition;
use std::collections::HashMap;
use std::sync::Arc;

/// Worker-side view of storage for one tier solve: the tier being
/// written plus any child tiers loaded for reading.
pub struct Database {
    store: Arc<dyn Store>,
    solving: Option<(Tier, Records)>,
    loaded: HashMap<Tier, Records>,
}

impl From<Arc<dyn Store>> for Database {
    fn from(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            solving: None,
            loaded: HashMap::new(),
        }
    }
}

// solving tier
impl Database {
    pub fn create_solving_tier(&mut self, tier: Tier, size: u64) -> Result<(), SolveError> {
        debug_assert!(self.solving.is_none());
        self.solving = Some((tier, Records::new(size)?));
        Ok(())
    }
    pub fn solving_tier(&self) -> Option<Tier> {
        self.solving.as_ref().map(|(tier, _)| *tier)
    }
    pub fn set(&self, position: Position, outcome: Outcome) {
        self.records().set(position, outcome)
    }
    pub fn get(&self, position: Position) -> Outcome {
        self.records().get(position)
    }
    /// Persist the solving tier in one piece.
    pub fn flush_solving_tier(&self) -> Result<(), SolveError> {
        let (tier, records) = self.solving.as_ref().expect("solving tier created");
        self.store.save(*tier, records)?;
        Ok(())
    }
    pub fn free_solving_tier(&mut self) {
        self.solving = None;
    }
    fn records(&self) -> &Records {
        &self.solving.as_ref().expect("solving tier created").1
    }
}

// loaded child tiers
impl Database {
    pub fn load_tier(&mut self, tier: Tier, size: u64) -> Result<(), SolveError> {
        if !self.loaded.contains_key(&tier) {
            let records = self.store.load(tier, size)?;
            self.loaded.insert(tier, records);
        }
        Ok(())
    }
    pub fn unload_tier(&mut self, tier: Tier) {
        self.loaded.remove(&tier);
    }
    pub fn unload_all(&mut self) {
        self.loaded.clear();
    }
    pub fn is_tier_loaded(&self, tier: Tier) -> bool {
        self.loaded.contains_key(&tier)
    }
    pub fn loaded(&self, tier: Tier) -> Option<&Records> {
        self.loaded.get(&tier)
    }
    /// Outcome of a position in a loaded tier; undecided if the tier is not loaded.
    pub fn get_from_loaded(&self, at: TierPosition) -> Outcome {
        self.loaded
            .get(&at.tier)
            .map(|records| records.get(at.position))
            .unwrap_or_default()
    }
}

// bookkeeping
impl Database {
    /// Bytes held by the solving tier and every loaded tier.
    pub fn usage(&self) -> usize {
        self.solving
            .iter()
            .map(|(_, r)| r)
            .chain(self.loaded.values())
            .map(|r| self.store.usage(r.len()))
            .sum()
    }
    pub fn usage_of(&self, size: u64) -> usize {
        self.store.usage(size)
    }
    pub fn probe(&self, at: TierPosition) -> Result<Outcome, StoreError> {
        self.store.probe(at)
    }
    pub fn status(&self, tier: Tier) -> Status {
        self.store.status(tier)
    }
}
