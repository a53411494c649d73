//! Orbs: static pellets that players eat to grow.

use glam::Vec2;
use protocol::{Color, OrbRecord};

pub type OrbId = u32;

/// An orb. Immutable until consumed.
#[derive(Debug, Clone)]
pub struct Orb {
    pub id: OrbId,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
}

impl Orb {
    pub fn new(id: OrbId, position: Vec2, size: f32, color: Color) -> Self {
        Self {
            id,
            position,
            size,
            color,
        }
    }

    pub fn record(&self) -> OrbRecord {
        OrbRecord {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            size: self.size,
            color: self.color,
        }
    }
}
