//! Game entities.
//!
//! Players and orbs live in the [`World`](crate::world::World); hazards are
//! owned by the hazard subsystem.

mod orb;
mod player;

pub use orb::{Orb, OrbId};
pub use player::{NewPlayer, Player, PlayerId, PlayerKind, PlayerState};
