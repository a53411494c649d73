//! Simulation error types.

use crate::entity::PlayerId;
use thiserror::Error;

/// Invariant violations detected while running a tick.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Player {0} vanished during resolution")]
    MissingPlayer(PlayerId),

    #[error("Player {id} has non-positive size {size}")]
    NonPositiveSize { id: PlayerId, size: f32 },

    #[error("Orb count drifted from {expected} to {actual}")]
    OrbCountDrift { expected: usize, actual: usize },

    #[error("Player {0} is both alive and pending removal")]
    AliveAndPendingRemoval(PlayerId),
}
