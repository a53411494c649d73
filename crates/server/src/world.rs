//! World state management.
//!
//! Owns every player and orb. Creation and removal go through this type so
//! the derived counters (human count, orb count) can never drift.

use crate::entity::{NewPlayer, Orb, OrbId, Player, PlayerId, PlayerKind};
use crate::level::Tiers;
use glam::Vec2;
use protocol::Color;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

/// Orb colors.
const ORB_PALETTE: &[Color] = &[
    Color::new(0xff, 0x6b, 0x6b),
    Color::new(0xff, 0xd9, 0x3d),
    Color::new(0x6b, 0xcb, 0x77),
    Color::new(0x4d, 0x96, 0xff),
    Color::new(0xc7, 0x7d, 0xff),
    Color::new(0x5e, 0xea, 0xd4),
    Color::new(0xff, 0x9f, 0x43),
];

/// World border bounds, `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy)]
pub struct WorldBorder {
    pub width: f32,
    pub height: f32,
}

impl WorldBorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Get a random position within the border.
    #[inline]
    pub fn random_position(&self, rng: &mut StdRng) -> Vec2 {
        Vec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }

    /// Random position at least `margin` away from every edge (falls back
    /// to the centre when the world is too small for the margin).
    pub fn random_inner_position(&self, margin: f32, rng: &mut StdRng) -> Vec2 {
        let sample = |extent: f32, rng: &mut StdRng| {
            if extent > margin * 2.0 {
                rng.random_range(margin..extent - margin)
            } else {
                extent / 2.0
            }
        };
        let x = sample(self.width, rng);
        let y = sample(self.height, rng);
        Vec2::new(x, y)
    }

    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// The four corners.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::ZERO,
            Vec2::new(self.width, 0.0),
            Vec2::new(0.0, self.height),
            Vec2::new(self.width, self.height),
        ]
    }

    /// Whether `p` is inside the border grown by `padding` on every side.
    #[inline]
    pub fn contains_padded(&self, p: Vec2, padding: f32) -> bool {
        p.x >= -padding
            && p.y >= -padding
            && p.x <= self.width + padding
            && p.y <= self.height + padding
    }
}

/// The game world containing all players and orbs.
#[derive(Debug)]
pub struct World {
    next_player_id: PlayerId,
    next_orb_id: OrbId,

    /// Players by id (ordered, so every pass over them is deterministic).
    players: BTreeMap<PlayerId, Player>,
    /// Orbs by id.
    orbs: BTreeMap<OrbId, Orb>,

    human_count: usize,

    /// Dead humans whose death has not been broadcast yet.
    pending_removal: Vec<PlayerId>,

    /// World border.
    pub border: WorldBorder,
}

impl World {
    /// Create a new, empty world with the given border size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            next_player_id: 1,
            next_orb_id: 1,
            players: BTreeMap::new(),
            orbs: BTreeMap::new(),
            human_count: 0,
            pending_removal: Vec::new(),
            border: WorldBorder::new(width, height),
        }
    }

    /// Create a player, tier bookkeeping included, and return its id.
    pub fn spawn_player(&mut self, spec: NewPlayer, tiers: &Tiers, now_ms: u64) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1).max(1);
        let mut spec = spec;
        spec.position = self.border.clamp(spec.position);
        let player = Player::new(id, spec, tiers, now_ms);
        if player.kind == PlayerKind::Human {
            self.human_count += 1;
        }
        self.players.insert(id, player);
        id
    }

    /// Remove a player from the world.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        if player.kind == PlayerKind::Human {
            self.human_count -= 1;
        }
        self.pending_removal.retain(|&p| p != id);
        Some(player)
    }

    /// Get a player by ID.
    #[inline]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Get a mutable player by ID.
    #[inline]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    #[inline]
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    #[inline]
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    #[inline]
    pub fn human_count(&self) -> usize {
        self.human_count
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Queue a dead player for removal at the start of the next tick.
    /// Returns false (and queues nothing) for unknown or living players.
    pub fn mark_pending_removal(&mut self, id: PlayerId) -> bool {
        match self.players.get(&id) {
            Some(p) if !p.alive => {
                if !self.pending_removal.contains(&id) {
                    self.pending_removal.push(id);
                }
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn is_pending_removal(&self, id: PlayerId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Remove every player queued by [`mark_pending_removal`](Self::mark_pending_removal).
    pub fn flush_pending_removals(&mut self) -> Vec<PlayerId> {
        let ids = std::mem::take(&mut self.pending_removal);
        ids.into_iter()
            .filter(|&id| self.remove_player(id).is_some())
            .collect()
    }

    /// Spawn one orb at a uniformly random position.
    pub fn spawn_orb(&mut self, size: f32, rng: &mut StdRng) -> OrbId {
        let id = self.next_orb_id;
        self.next_orb_id = self.next_orb_id.wrapping_add(1).max(1);
        let position = self.border.random_position(rng);
        let color = ORB_PALETTE[rng.random_range(0..ORB_PALETTE.len())];
        self.orbs.insert(id, Orb::new(id, position, size, color));
        id
    }

    /// Spawn orbs until `count` exist.
    pub fn fill_orbs(&mut self, count: usize, size: f32, rng: &mut StdRng) {
        while self.orbs.len() < count {
            self.spawn_orb(size, rng);
        }
    }

    /// Consume an orb and spawn its replacement. Returns the new orb's id,
    /// or None (and changes nothing) if `id` does not exist.
    pub fn replace_orb(&mut self, id: OrbId, rng: &mut StdRng) -> Option<OrbId> {
        let eaten = self.orbs.remove(&id)?;
        Some(self.spawn_orb(eaten.size, rng))
    }

    #[inline]
    pub fn orb(&self, id: OrbId) -> Option<&Orb> {
        self.orbs.get(&id)
    }

    #[inline]
    pub fn orbs(&self) -> impl Iterator<Item = &Orb> {
        self.orbs.values()
    }

    #[inline]
    pub fn orb_count(&self) -> usize {
        self.orbs.len()
    }

    /// Insert an orb at a fixed position (scenario setup).
    pub fn insert_orb_at(&mut self, position: Vec2, size: f32) -> OrbId {
        let id = self.next_orb_id;
        self.next_orb_id = self.next_orb_id.wrapping_add(1).max(1);
        self.orbs.insert(id, Orb::new(id, position, size, ORB_PALETTE[0]));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PlayerState;
    use crate::level::LevelBand;
    use rand::SeedableRng;

    fn tiers() -> Tiers {
        Tiers::new(vec![LevelBand { key: "a".into(), min: 0.0, max: 1.0e9 }], 20.0, 5.0)
    }

    fn spec(kind: PlayerKind) -> NewPlayer {
        NewPlayer {
            kind,
            name: "p".into(),
            position: Vec2::new(-50.0, 10.0),
            size: 20.0,
            state: PlayerState::Normal,
        }
    }

    #[test]
    fn test_spawn_and_remove_keep_counts() {
        let tiers = tiers();
        let mut world = World::new(1000.0, 1000.0);
        let human = world.spawn_player(spec(PlayerKind::Human), &tiers, 0);
        let _bot = world.spawn_player(spec(PlayerKind::Bot), &tiers, 0);
        assert_eq!(world.human_count(), 1);
        assert_eq!(world.player_count(), 2);
        assert_eq!(world.player(human).unwrap().position.x, 0.0);

        world.remove_player(human);
        assert_eq!(world.human_count(), 0);
        assert!(world.remove_player(human).is_none());
        assert_eq!(world.human_count(), 0);
    }

    #[test]
    fn test_replace_orb_conserves_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = World::new(1000.0, 1000.0);
        world.fill_orbs(50, 5.0, &mut rng);
        let first = world.orbs().next().unwrap().id;
        let new_id = world.replace_orb(first, &mut rng).unwrap();
        assert_ne!(first, new_id);
        assert_eq!(world.orb_count(), 50);
        assert!(world.replace_orb(first, &mut rng).is_none());
        assert_eq!(world.orb_count(), 50);
    }

    #[test]
    fn test_pending_removal_requires_dead_player() {
        let tiers = tiers();
        let mut world = World::new(1000.0, 1000.0);
        let id = world.spawn_player(spec(PlayerKind::Human), &tiers, 0);
        assert!(!world.mark_pending_removal(id));

        world.player_mut(id).unwrap().alive = false;
        assert!(world.mark_pending_removal(id));
        assert!(world.is_pending_removal(id));
        assert_eq!(world.flush_pending_removals(), vec![id]);
        assert!(world.player(id).is_none());
        assert!(world.flush_pending_removals().is_empty());
    }
}
