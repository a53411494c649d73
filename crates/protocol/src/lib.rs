//! Shared protocol crate for the nebula game server.
//!
//! Every frame on the wire is a JSON text message of the form
//! `{"event": <name>, "data": <payload>}`. This crate contains:
//! - Client -> server events ([`ClientEvent`])
//! - Server -> client events ([`ServerEvent`]) and the delta records
//! - Shared types (Color, Point)

mod error;
pub mod packets;

pub use error::ProtocolError;
pub use packets::*;

use serde::{Serialize, Serializer};

/// Largest inbound frame the server will try to decode.
pub const MAX_FRAME_LEN: usize = 4096;

/// RGB color used for orbs and players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation, e.g. `#ff8800`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// Decode a client frame.
pub fn decode(text: &str) -> Result<ClientEvent, ProtocolError> {
    if text.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}

/// Encode a server event as a JSON text frame.
pub fn encode(event: &ServerEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}
