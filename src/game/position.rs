use crate::Position;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

/// A position qualified by the tier it lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TierPosition {
    pub tier: Tier,
    pub position: Position,
}

impl TierPosition {
    pub const fn new(tier: Tier, position: Position) -> Self {
        Self { tier, position }
    }
}

impl From<(Tier, Position)> for TierPosition {
    fn from((tier, position): (Tier, Position)) -> Self {
        Self::new(tier, position)
    }
}

impl std::fmt::Display for TierPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}:{}]", self.tier, self.position)
    }
}

/// How a tier's positions relate to each other, which decides the algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierType {
    /// Every move leaves the tier, so one value-iteration sweep per
    /// batch of loaded children is enough.
    ImmediateTransition,
    /// Moves may stay inside the tier and form cycles.
    #[default]
    Loopy,
}
