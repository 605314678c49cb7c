use crate::Move;
use crate::Position;
use crate::Tier;
use crate::game::*;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
struct Layer {
    size: u64,
    tier_type: TierType,
    canonical: Option<Tier>,
    primitives: HashMap<Position, Value>,
    edges: HashMap<Position, Vec<TierPosition>>,
    aliases: HashMap<Position, Position>,
    illegal: HashSet<Position>,
    children: Option<Vec<Tier>>,
    /// For a mirror: the canonical-tier position of each of its positions, and back.
    image: Vec<Position>,
    preimage: Vec<Position>,
}

/// A game given by an explicit move graph. Handy for small synthetic tier
/// graphs: loopy tiers, symmetric tiers, malformed graphs.
///
/// A mirrored tier is its source's positions and moves, renumbered by a
/// permutation (the identity unless one is given). Aliased positions map
/// to their canonical representative within the tier.
#[derive(Debug, Clone)]
pub struct ExplicitGame {
    tiers: BTreeMap<Tier, Layer>,
    initial: TierPosition,
    retrograde: bool,
}

impl ExplicitGame {
    pub fn builder() -> ExplicitBuilder {
        ExplicitBuilder::default()
    }
    fn layer(&self, tier: Tier) -> Option<&Layer> {
        self.tiers.get(&tier)
    }
    fn edges(&self, at: TierPosition) -> &[TierPosition] {
        self.layer(at.tier)
            .and_then(|l| l.edges.get(&at.position))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl TierGame for ExplicitGame {
    fn initial_tier(&self) -> Tier {
        self.initial.tier
    }
    fn initial_position(&self) -> Position {
        self.initial.position
    }
    fn tier_size(&self, tier: Tier) -> u64 {
        self.layer(tier).map_or(0, |l| l.size)
    }
    fn moves(&self, at: TierPosition) -> Vec<Move> {
        (0..self.edges(at).len() as Move).collect()
    }
    fn primitive(&self, at: TierPosition) -> Value {
        self.layer(at.tier)
            .and_then(|l| l.primitives.get(&at.position))
            .copied()
            .unwrap_or_default()
    }
    fn do_move(&self, at: TierPosition, mv: Move) -> TierPosition {
        self.edges(at)[mv as usize]
    }
    fn is_legal(&self, at: TierPosition) -> bool {
        self.layer(at.tier)
            .is_some_and(|l| at.position < l.size && !l.illegal.contains(&at.position))
    }
    fn child_tiers(&self, tier: Tier) -> Vec<Tier> {
        let Some(layer) = self.layer(tier) else {
            return Vec::new();
        };
        if let Some(children) = layer.children.clone() {
            return children;
        }
        let mut children = layer
            .edges
            .values()
            .flatten()
            .map(|child| child.tier)
            .filter(|&child| child != tier)
            .collect::<Vec<_>>();
        children.sort_unstable();
        children.dedup();
        children
    }
    fn canonical_tier(&self, tier: Tier) -> Tier {
        self.layer(tier).and_then(|l| l.canonical).unwrap_or(tier)
    }
    fn position_in_symmetric_tier(&self, at: TierPosition, symmetric: Tier) -> Position {
        let into = self
            .layer(at.tier)
            .filter(|l| l.canonical == Some(symmetric))
            .map(|l| &l.image);
        let back = self
            .layer(symmetric)
            .filter(|l| l.canonical == Some(at.tier))
            .map(|l| &l.preimage);
        into.or(back)
            .filter(|_| at.tier != symmetric)
            .and_then(|map| map.get(at.position as usize))
            .copied()
            .unwrap_or(at.position)
    }
    fn canonical_position(&self, at: TierPosition) -> Position {
        self.layer(at.tier)
            .and_then(|l| l.aliases.get(&at.position))
            .copied()
            .unwrap_or(at.position)
    }
    fn tier_type(&self, tier: Tier) -> TierType {
        self.layer(tier).map(|l| l.tier_type).unwrap_or_default()
    }
    fn retrograde(&self) -> Option<&dyn Retrograde> {
        match self.retrograde {
            true => Some(self),
            false => None,
        }
    }
}

impl Retrograde for ExplicitGame {
    fn canonical_parent_positions(&self, child: TierPosition, parent_tier: Tier) -> Vec<Position> {
        (0..self.tier_size(parent_tier))
            .map(|p| TierPosition::new(parent_tier, p))
            .filter(|&p| self.is_legal(p))
            .filter(|&p| self.canonical_position(p) == p.position)
            .filter(|&p| self.primitive(p) == Value::Undecided)
            .filter(|&p| self.canonical_child_positions(p).contains(&child))
            .map(|p| p.position)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ExplicitBuilder {
    tiers: BTreeMap<Tier, Layer>,
    mirrors: Vec<(Tier, Tier, Option<Vec<Position>>)>,
    initial: TierPosition,
    retrograde: bool,
}

impl ExplicitBuilder {
    pub fn tier(mut self, tier: Tier, size: u64, tier_type: TierType) -> Self {
        let layer = self.tiers.entry(tier).or_default();
        layer.size = size;
        layer.tier_type = tier_type;
        self
    }
    pub fn primitive(mut self, at: impl Into<TierPosition>, value: Value) -> Self {
        let at = at.into();
        self.tiers
            .entry(at.tier)
            .or_default()
            .primitives
            .insert(at.position, value);
        self
    }
    pub fn edge(mut self, from: impl Into<TierPosition>, to: impl Into<TierPosition>) -> Self {
        let from = from.into();
        self.tiers
            .entry(from.tier)
            .or_default()
            .edges
            .entry(from.position)
            .or_default()
            .push(to.into());
        self
    }
    pub fn illegal(mut self, at: impl Into<TierPosition>) -> Self {
        let at = at.into();
        self.tiers.entry(at.tier).or_default().illegal.insert(at.position);
        self
    }
    /// Declare `at` equivalent to the canonical position `canonical` of the same tier.
    pub fn alias(mut self, at: impl Into<TierPosition>, canonical: Position) -> Self {
        let at = at.into();
        self.tiers
            .entry(at.tier)
            .or_default()
            .aliases
            .insert(at.position, canonical);
        self
    }
    /// Override the child tiers reported for `tier`.
    pub fn children(mut self, tier: Tier, children: Vec<Tier>) -> Self {
        self.tiers.entry(tier).or_default().children = Some(children);
        self
    }
    /// Make `tier` a symmetric copy of the canonical tier `canonical`.
    pub fn mirror(mut self, tier: Tier, canonical: Tier) -> Self {
        self.mirrors.push((tier, canonical, None));
        self
    }
    /// Like [`mirror`](Self::mirror), with position `p` of `tier` standing
    /// for position `image[p]` of `canonical`. `image` must be a permutation.
    pub fn mirror_with(mut self, tier: Tier, canonical: Tier, image: Vec<Position>) -> Self {
        self.mirrors.push((tier, canonical, Some(image)));
        self
    }
    pub fn initial(mut self, at: impl Into<TierPosition>) -> Self {
        self.initial = at.into();
        self
    }
    pub fn retrograde(mut self) -> Self {
        self.retrograde = true;
        self
    }
    pub fn build(mut self) -> ExplicitGame {
        for (tier, canonical, image) in std::mem::take(&mut self.mirrors) {
            let source = self.tiers.get(&canonical).cloned().unwrap_or_default();
            let image = image.unwrap_or_else(|| (0..source.size).collect());
            let mut preimage = vec![0; image.len()];
            for (p, &q) in image.iter().enumerate() {
                preimage[q as usize] = p as Position;
            }
            assert!(
                image.len() as u64 == source.size && preimage.iter().enumerate().all(|(q, &p)| image[p as usize] == q as Position),
                "mirror {} of {} is not a permutation",
                tier,
                canonical
            );
            let at = |q: &Position| preimage[*q as usize];
            let mut layer = Layer {
                size: source.size,
                tier_type: source.tier_type,
                canonical: Some(canonical),
                primitives: source.primitives.iter().map(|(q, &v)| (at(q), v)).collect(),
                edges: source.edges.iter().map(|(q, e)| (at(q), e.clone())).collect(),
                aliases: source.aliases.iter().map(|(q, c)| (at(q), at(c))).collect(),
                illegal: source.illegal.iter().map(at).collect(),
                children: source.children.clone(),
                image,
                preimage,
            };
            if let Some(own) = self.tiers.get(&tier).and_then(|l| l.children.clone()) {
                layer.children = Some(own);
            }
            self.tiers.insert(tier, layer);
        }
        ExplicitGame {
            tiers: self.tiers,
            initial: self.initial,
            retrograde: self.retrograde,
        }
    }
}
