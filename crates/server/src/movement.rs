//! Movement and kinematics.
//!
//! Players seek their target directly (no inertia). Bigger effective radius
//! means slower movement. Hazard drift is the only injected velocity.

use crate::config::Config;
use crate::entity::{Player, PlayerState};
use crate::level::Tiers;
use crate::world::{World, WorldBorder};

/// Speed in units per reference frame for a given effective radius.
#[inline]
pub fn speed_for(base_speed: f32, base_radius: f32, effective_radius: f32) -> f32 {
    base_speed * (base_radius / effective_radius)
}

/// Advance every eligible player by `dt_ms`.
pub fn update_player_movement(world: &mut World, tiers: &Tiers, config: &Config, dt_ms: f32) {
    let frames = dt_ms / config.player.reference_frame_ms;
    let border = world.border;
    for player in world.players_mut() {
        move_player(player, tiers, config, frames, border);
    }
}

fn move_player(
    player: &mut Player,
    tiers: &Tiers,
    config: &Config,
    frames: f32,
    border: WorldBorder,
) {
    if !player.alive || player.state != PlayerState::Normal {
        return;
    }

    // Without a target only hazard drift moves the player.
    if let Some(target) = player.target {
        let mut speed = speed_for(
            config.player.base_speed,
            tiers.base_radius,
            player.effective_radius(tiers),
        ) * player.speed_factor;
        if player.is_bot() {
            speed *= config.bots.speed_multiplier;
        }

        let offset = target - player.position;
        let dist = offset.length();
        let step = speed * frames;
        if dist <= step {
            player.position = target;
        } else if dist > 0.0 {
            player.position += offset / dist * step;
        }
    }

    player.position += player.drift * frames;
    player.position = border.clamp(player.position);
}
