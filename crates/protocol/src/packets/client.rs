//! Client -> Server events.

use super::Point;
use serde::{Deserialize, Serialize};

/// Parsed client event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Register a player under the given name.
    SetName(String),
    /// New movement target.
    Move(Point),
    /// Teleport request.
    QuantumTunnel(TunnelRequest),
    /// Request to start the gravitational pull event.
    ReachedSupercumulo,
}

/// Payload of `quantumTunnel`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TunnelRequest {
    pub to: Point,
}
