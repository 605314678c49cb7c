use super::*;
use crate::Move;
use crate::Position;
use crate::Tier;
use std::sync::Arc;

/// A finite two-player game whose positions are partitioned into tiers.
///
/// Required methods describe the raw game. Provided methods describe tier
/// and position symmetry and default to "no symmetry".
pub trait TierGame: Send + Sync {
    fn initial_tier(&self) -> Tier;
    fn initial_position(&self) -> Position;
    /// Upper bound on position indices in `tier`, legal or not.
    fn tier_size(&self, tier: Tier) -> u64;
    fn moves(&self, at: TierPosition) -> Vec<Move>;
    /// `Value::Undecided` unless the game is over at `at`.
    fn primitive(&self, at: TierPosition) -> Value;
    fn do_move(&self, at: TierPosition, mv: Move) -> TierPosition;
    fn is_legal(&self, at: TierPosition) -> bool;
    /// Tiers reachable in one move from `tier`, excluding `tier` itself.
    fn child_tiers(&self, tier: Tier) -> Vec<Tier>;

    fn canonical_tier(&self, tier: Tier) -> Tier {
        tier
    }
    /// The position in `symmetric` equivalent to `at`.
    /// Must send canonical positions to canonical positions.
    fn position_in_symmetric_tier(&self, at: TierPosition, symmetric: Tier) -> Position {
        debug_assert!(at.tier == symmetric);
        at.position
    }
    /// Representative of `at` among its symmetric positions in the same tier.
    fn canonical_position(&self, at: TierPosition) -> Position {
        at.position
    }
    /// Distinct children of `at`, each canonical within its own tier.
    fn canonical_child_positions(&self, at: TierPosition) -> Vec<TierPosition> {
        let mut children = self
            .moves(at)
            .into_iter()
            .map(|mv| self.do_move(at, mv))
            .map(|child| TierPosition::new(child.tier, self.canonical_position(child)))
            .collect::<Vec<_>>();
        children.sort_unstable();
        children.dedup();
        children
    }
    fn tier_type(&self, _: Tier) -> TierType {
        TierType::Loopy
    }
    fn tier_name(&self, tier: Tier) -> String {
        tier.to_string()
    }
    /// Parent enumeration, if the game can provide it.
    fn retrograde(&self) -> Option<&dyn Retrograde> {
        None
    }
}

/// Optional capability: enumerate parents of a position directly.
pub trait Retrograde: Send + Sync {
    /// Canonical positions in `parent_tier` with `child` among their canonical children.
    fn canonical_parent_positions(&self, child: TierPosition, parent_tier: Tier) -> Vec<Position>;
}

/// A game with its optional capabilities resolved once.
#[derive(Clone)]
pub struct Api {
    game: Arc<dyn TierGame>,
    retrograde: bool,
}

impl From<Arc<dyn TierGame>> for Api {
    fn from(game: Arc<dyn TierGame>) -> Self {
        let retrograde = game.retrograde().is_some();
        Self { game, retrograde }
    }
}

impl Api {
    pub fn new<G: TierGame + 'static>(game: G) -> Self {
        Self::from(Arc::new(game) as Arc<dyn TierGame>)
    }
    pub fn game(&self) -> &dyn TierGame {
        self.game.as_ref()
    }
    pub fn has_retrograde(&self) -> bool {
        self.retrograde
    }
    pub fn initial(&self) -> TierPosition {
        TierPosition::new(self.game.initial_tier(), self.game.initial_position())
    }
    pub fn initial_tier(&self) -> Tier {
        self.game.initial_tier()
    }
    pub fn tier_size(&self, tier: Tier) -> u64 {
        self.game.tier_size(tier)
    }
    pub fn primitive(&self, at: TierPosition) -> Value {
        self.game.primitive(at)
    }
    pub fn is_legal(&self, at: TierPosition) -> bool {
        self.game.is_legal(at)
    }
    pub fn child_tiers(&self, tier: Tier) -> Vec<Tier> {
        self.game.child_tiers(tier)
    }
    pub fn canonical_tier(&self, tier: Tier) -> Tier {
        self.game.canonical_tier(tier)
    }
    pub fn is_canonical_tier(&self, tier: Tier) -> bool {
        self.game.canonical_tier(tier) == tier
    }
    pub fn canonical_position(&self, at: TierPosition) -> Position {
        self.game.canonical_position(at)
    }
    pub fn is_canonical_position(&self, at: TierPosition) -> bool {
        self.game.canonical_position(at) == at.position
    }
    pub fn position_in_symmetric_tier(&self, at: TierPosition, symmetric: Tier) -> Position {
        self.game.position_in_symmetric_tier(at, symmetric)
    }
    pub fn canonical_child_positions(&self, at: TierPosition) -> Vec<TierPosition> {
        self.game.canonical_child_positions(at)
    }
    pub fn tier_type(&self, tier: Tier) -> TierType {
        self.game.tier_type(tier)
    }
    pub fn tier_name(&self, tier: Tier) -> String {
        self.game.tier_name(tier)
    }
    /// Canonical parents of `child` in `parent_tier`, when the game enumerates parents.
    pub fn canonical_parent_positions(
        &self,
        child: TierPosition,
        parent_tier: Tier,
    ) -> Option<Vec<Position>> {
        self.game
            .retrograde()
            .map(|r| r.canonical_parent_positions(child, parent_tier))
    }
    /// Canonical child tiers of `tier`, deduplicated and sorted.
    pub fn canonical_child_tiers(&self, tier: Tier) -> Vec<Tier> {
        let mut children = self
            .child_tiers(tier)
            .into_iter()
            .map(|child| self.canonical_tier(child))
            .collect::<Vec<_>>();
        children.sort_unstable();
        children.dedup();
        children
    }
    /// The canonical representative of `at` across both tier and position symmetry.
    pub fn canonical(&self, at: TierPosition) -> TierPosition {
        let tier = self.canonical_tier(at.tier);
        let position = match tier == at.tier {
            true => at.position,
            false => self.position_in_symmetric_tier(at, tier),
        };
        let image = TierPosition::new(tier, position);
        TierPosition::new(tier, self.canonical_position(image))
    }
}
