//! Players (humans and bots).

use crate::level::Tiers;
use glam::Vec2;
use protocol::PlayerRecord;

pub type PlayerId = u32;

/// Who drives the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Human,
    Bot,
}

/// Lifecycle state, orthogonal to `alive`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerState {
    /// Regular physics and input.
    Normal,
    /// Dragged toward the rally point by the gravitational pull.
    Pulled,
    /// Immobile; regrows until `regrown` reaches the configured cap.
    Frozen { regrown: f32 },
    /// Static helper spawned by the gravitational pull.
    Anchored,
}

/// Data needed to create a player in one step.
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub kind: PlayerKind,
    pub name: String,
    pub position: Vec2,
    pub size: f32,
    pub state: PlayerState,
}

/// A player in the world.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub kind: PlayerKind,
    pub name: String,
    pub position: Vec2,
    /// Growth metric; always >= the configured minimum.
    size: f32,
    /// Tier index the player is currently in.
    tier: usize,
    /// Size the player had when it entered its current tier.
    level_entry_size: f32,
    pub target: Option<Vec2>,
    pub alive: bool,
    pub state: PlayerState,
    /// Velocity injected by hazards, units per reference frame.
    pub drift: Vec2,
    /// Movement speed multiplier injected by hazards.
    pub speed_factor: f32,
    /// Simulation clock (ms) at creation or last respawn.
    pub joined_at_ms: u64,
}

impl Player {
    pub(crate) fn new(id: PlayerId, spec: NewPlayer, tiers: &Tiers, now_ms: u64) -> Self {
        let size = spec.size.max(tiers.min_size);
        Self {
            id,
            kind: spec.kind,
            name: spec.name,
            position: spec.position,
            size,
            tier: tiers.tier_of(size),
            level_entry_size: size,
            target: None,
            alive: true,
            state: spec.state,
            drift: Vec2::ZERO,
            speed_factor: 1.0,
            joined_at_ms: now_ms,
        }
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[inline]
    pub fn level_entry_size(&self) -> f32 {
        self.level_entry_size
    }

    #[inline]
    pub fn is_bot(&self) -> bool {
        self.kind == PlayerKind::Bot
    }

    #[inline]
    pub fn effective_radius(&self, tiers: &Tiers) -> f32 {
        tiers.effective_radius(self.size, self.level_entry_size)
    }

    /// Whether movement and teleport commands are accepted.
    #[inline]
    pub fn accepts_input(&self) -> bool {
        self.alive && self.state == PlayerState::Normal
    }

    /// Set the size, clamped to the floor. Entering a different tier resets
    /// the baseline to the new size. Returns true when the tier changed.
    pub fn set_size(&mut self, size: f32, tiers: &Tiers) -> bool {
        self.size = size.max(tiers.min_size);
        let tier = tiers.tier_of(self.size);
        if tier != self.tier {
            self.tier = tier;
            self.level_entry_size = self.size;
            true
        } else {
            false
        }
    }

    pub fn grow(&mut self, amount: f32, tiers: &Tiers) -> bool {
        self.set_size(self.size + amount, tiers)
    }

    /// Put a dead player back into play with a fresh size and baseline.
    pub fn respawn(&mut self, position: Vec2, size: f32, tiers: &Tiers, now_ms: u64) {
        self.size = size.max(tiers.min_size);
        self.tier = tiers.tier_of(self.size);
        self.level_entry_size = self.size;
        self.position = position;
        self.target = None;
        self.alive = true;
        self.state = PlayerState::Normal;
        self.drift = Vec2::ZERO;
        self.speed_factor = 1.0;
        self.joined_at_ms = now_ms;
    }

    /// Wire record with positions and sizes quantised to 0.01.
    pub fn record(&self, tiers: &Tiers) -> PlayerRecord {
        PlayerRecord {
            id: self.id,
            name: self.name.clone(),
            x: quantize(self.position.x),
            y: quantize(self.position.y),
            size: quantize(self.size),
            radius: quantize(self.effective_radius(tiers)),
            level_key: tiers.key(self.tier).to_string(),
            alive: self.alive,
            is_bot: self.is_bot(),
        }
    }
}

#[inline]
fn quantize(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
