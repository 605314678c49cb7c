use crate::Position;
use crate::TEST_SAMPLE_MAX;
use crate::Tier;
use crate::error::CheckError;
use crate::game::Api;
use crate::game::TierPosition;
use crate::game::Value;
use rand::Rng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

/// Consistency checks of a game implementation on a sample of one tier.
///
/// Small tiers are checked exhaustively, large ones on a seeded random
/// sample. Checks cover symmetry mappings, child legality, and agreement
/// between children and parents when the game enumerates parents.
pub struct Checker<'a> {
    api: &'a Api,
    tier: Tier,
    parents: Vec<Tier>,
}

impl<'a> Checker<'a> {
    /// `parents` are the tiers listing `tier` among their children.
    pub fn new(api: &'a Api, tier: Tier, parents: Vec<Tier>) -> Self {
        Self { api, tier, parents }
    }

    /// Returns the number of legal positions checked.
    pub fn check(&self, rng: &mut SmallRng) -> Result<usize, CheckError> {
        self.sample(rng)
            .par_iter()
            .map(|&p| TierPosition::new(self.tier, p))
            .filter(|&at| self.api.is_legal(at))
            .map(|at| -> Result<usize, CheckError> {
                self.symmetry(at)?;
                if self.api.is_canonical_position(at) {
                    self.children(at)?;
                    self.parents(at)?;
                }
                Ok(1)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }

    fn sample(&self, rng: &mut SmallRng) -> Vec<Position> {
        let size = self.api.tier_size(self.tier);
        match size as usize <= TEST_SAMPLE_MAX {
            true => (0..size).collect(),
            false => (0..TEST_SAMPLE_MAX)
                .map(|_| rng.random_range(0..size))
                .collect(),
        }
    }

    /// Mapping into one's own tier is the identity, and mapping into the
    /// canonical tier and back returns the same position.
    fn symmetry(&self, at: TierPosition) -> Result<(), CheckError> {
        let image = self.api.position_in_symmetric_tier(at, at.tier);
        if image != at.position {
            return Err(CheckError::SymmetrySelfMapping { at, image });
        }
        let canonical = self.api.canonical_tier(at.tier);
        if canonical == at.tier {
            return Ok(());
        }
        let image = TierPosition::new(
            canonical,
            self.api.position_in_symmetric_tier(at, canonical),
        );
        let back = self.api.position_in_symmetric_tier(image, at.tier);
        if back != at.position {
            return Err(CheckError::SymmetryInconsistent { at, image, back });
        }
        if self.api.is_canonical_position(at) && !self.api.is_canonical_position(image) {
            return Err(CheckError::NonCanonicalImage { at, image });
        }
        Ok(())
    }

    /// Every child is in range, legal and canonical within its tier.
    fn children(&self, at: TierPosition) -> Result<(), CheckError> {
        for child in self.api.canonical_child_positions(at) {
            let legal = child.position < self.api.tier_size(child.tier)
                && self.api.is_legal(child)
                && self.api.is_canonical_position(child);
            if !legal {
                return Err(CheckError::IllegalChild { parent: at, child });
            }
        }
        Ok(())
    }

    /// Children list `at` as a parent, and every listed parent of
    /// `at` really has `at` as a child.
    fn parents(&self, at: TierPosition) -> Result<(), CheckError> {
        if !self.api.has_retrograde() {
            return Ok(());
        }
        if self.api.primitive(at) == Value::Undecided {
            for child in self.api.canonical_child_positions(at) {
                let parents = self
                    .api
                    .canonical_parent_positions(child, at.tier)
                    .unwrap_or_default();
                if !parents.contains(&at.position) {
                    return Err(CheckError::ChildParentMismatch { parent: at, child });
                }
            }
        }
        for tier in std::iter::once(at.tier).chain(self.parents.iter().copied()) {
            for position in self
                .api
                .canonical_parent_positions(at, tier)
                .unwrap_or_default()
            {
                let parent = TierPosition::new(tier, position);
                let legal = position < self.api.tier_size(tier) && self.api.is_legal(parent);
                if !legal || !self.api.canonical_child_positions(parent).contains(&at) {
                    return Err(CheckError::ParentChildMismatch { parent, child: at });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TierType;
    use crate::games::ExplicitGame;
    use crate::games::TicTacToe;
    use rand::SeedableRng;

    #[test]
    fn consistent_games_pass() {
        let ref mut rng = SmallRng::seed_from_u64(crate::TEST_SEED_DEFAULT);
        let ref api = Api::new(TicTacToe::new().with_retrograde());
        let mut total = 0;
        for tier in 0..=9u64 {
            let parents = tier.checked_sub(1).into_iter().collect();
            let checked = Checker::new(api, tier, parents).check(rng).unwrap();
            assert!(checked <= TEST_SAMPLE_MAX);
            total += checked;
        }
        assert!(total > 0);
    }

    #[test]
    fn only_legal_positions_count() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let ref api = Api::new(
            ExplicitGame::builder()
                .tier(0, 5, TierType::Loopy)
                .edge((0, 0), (0, 1))
                .primitive((0, 1), Value::Lose)
                .primitive((0, 4), Value::Win)
                .illegal((0, 2))
                .illegal((0, 3))
                .build(),
        );
        assert!(Checker::new(api, 0, vec![]).check(rng).unwrap() == 3);
    }

    #[test]
    fn illegal_children_are_caught() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let ref api = Api::new(
            ExplicitGame::builder()
                .tier(0, 2, TierType::Loopy)
                .edge((0, 0), (0, 1))
                .illegal((0, 1))
                .build(),
        );
        assert!(matches!(
            Checker::new(api, 0, vec![]).check(rng),
            Err(CheckError::IllegalChild { .. })
        ));
    }

    #[test]
    fn explicit_parents_agree_with_children() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let ref api = Api::new(
            ExplicitGame::builder()
                .tier(0, 3, TierType::Loopy)
                .edge((0, 0), (0, 1))
                .primitive((0, 1), Value::Lose)
                .retrograde()
                .build(),
        );
        assert!(Checker::new(api, 0, vec![]).check(rng).is_ok());
    }
}
