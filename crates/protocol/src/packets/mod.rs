//! Event definitions for the game protocol.
//!
//! This module contains both client->server and server->client events.

mod client;
mod server;

pub use client::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// A point in world coordinates as it appears on the wire (`{x, y}`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<crate::Position> for Point {
    fn from(v: crate::Position) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for crate::Position {
    fn from(p: Point) -> Self {
        crate::Position::new(p.x, p.y)
    }
}
