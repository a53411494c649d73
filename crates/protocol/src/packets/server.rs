//! Server -> Client events and the records they carry.

use super::Point;
use crate::Color;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Reply to a successful `setName`.
    Init(InitData),
    /// Reply to a rejected `setName`.
    NameError(NameError),
    /// Capacity notice, sent right before the connection is closed.
    GameFull(Notice),
    /// World delta (or full snapshot for a freshly joined client).
    GameState(GameStateDelta),
    /// Terminal notice for an eliminated human player.
    GameOver(GameOver),
    /// The special event has begun.
    GravitationalPull(GravitationalPull),
    /// The player went through a white hole.
    WhiteHoleUsed(WhiteHoleUsed),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitData {
    pub player_id: u32,
    pub world_width: f32,
    pub world_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameError {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub message: String,
    pub killed_by: String,
    pub final_size: f32,
    /// Seconds between joining and dying.
    pub survival_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GravitationalPull {
    pub center: Point,
    /// Milliseconds.
    pub duration: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhiteHoleUsed {
    pub to: Point,
}

/// A player as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Effective radius, the scale clients should draw at.
    pub radius: f32,
    pub level_key: String,
    pub alive: bool,
    pub is_bot: bool,
}

impl PlayerRecord {
    /// Whether any field clients care about differs from `other`.
    ///
    /// The radius is derived from size and tier, so it is not compared.
    pub fn differs_from(&self, other: &PlayerRecord) -> bool {
        self.x != other.x
            || self.y != other.y
            || self.size != other.size
            || self.name != other.name
            || self.level_key != other.level_key
            || self.alive != other.alive
    }
}

/// An orb as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Color,
}

/// Hazard kinds visible to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HazardKind {
    BlackHole,
    WhiteHole,
    Asteroid,
    OrbitalBlackHole,
    Quasar,
    DarkMatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardRecord {
    pub id: u32,
    pub kind: HazardKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Read-only view of every active hazard.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardSnapshot {
    pub black_hole: Option<HazardRecord>,
    pub white_hole: Option<HazardRecord>,
    pub asteroids: Vec<HazardRecord>,
    pub orbital: Vec<HazardRecord>,
}

impl HazardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.black_hole.is_none()
            && self.white_hole.is_none()
            && self.asteroids.is_empty()
            && self.orbital.is_empty()
    }
}

/// Payload of `gameState`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDelta {
    pub players: BTreeMap<u32, PlayerRecord>,
    pub removed_players: Vec<u32>,
    pub orbs: Vec<OrbRecord>,
    pub removed_orbs: Vec<u32>,
    pub hazards: HazardSnapshot,
}

impl GameStateDelta {
    /// Whether broadcasting this delta would tell clients anything.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
            && self.removed_players.is_empty()
            && self.orbs.is_empty()
            && self.removed_orbs.is_empty()
            && self.hazards.is_empty()
    }
}
