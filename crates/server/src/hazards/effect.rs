//! Hazard effect strategies.

use crate::entity::{Player, PlayerId};
use glam::Vec2;
use std::collections::HashSet;

/// Continuous field applied to players within `range` of the hazard centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perturbation {
    /// Drift toward the centre, strongest at the centre.
    Pull { range: f32, strength: f32 },
    /// Drift away from the centre, strongest at the centre.
    Repel { range: f32, strength: f32 },
    /// Multiply movement speed by `factor`.
    Damp { range: f32, factor: f32 },
}

impl Perturbation {
    /// Apply to `player` standing at `distance` from `center`.
    pub fn apply(&self, player: &mut Player, center: Vec2, distance: f32) {
        match *self {
            Perturbation::Pull { range, strength } => {
                if distance < range {
                    let toward = (center - player.position).normalize_or_zero();
                    player.drift += toward * strength * (1.0 - distance / range);
                }
            }
            Perturbation::Repel { range, strength } => {
                if distance < range {
                    let away = (player.position - center).normalize_or_zero();
                    player.drift += away * strength * (1.0 - distance / range);
                }
            }
            Perturbation::Damp { range, factor } => {
                if distance < range {
                    player.speed_factor = player.speed_factor.min(factor);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Overlap is instant death.
    Kill,
    /// Overlap teleports each player at most once.
    TeleportOnce { used_by: HashSet<PlayerId> },
    /// First overlap halves the player's size and consumes the hazard.
    Shatter,
    Perturb(Perturbation),
}

impl Effect {
    pub fn teleport_once() -> Self {
        Effect::TeleportOnce {
            used_by: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NewPlayer, PlayerKind, PlayerState};
    use crate::world::World;

    fn player_at(pos: Vec2) -> (World, PlayerId) {
        let tiers = crate::config::Config::default().tiers();
        let mut world = World::new(1000.0, 1000.0);
        let id = world.spawn_player(
            NewPlayer {
                kind: PlayerKind::Human,
                name: "p".into(),
                position: pos,
                size: 20.0,
                state: PlayerState::Normal,
            },
            &tiers,
            0,
        );
        (world, id)
    }

    #[test]
    fn test_pull_scales_with_proximity() {
        let (mut world, id) = player_at(Vec2::new(150.0, 100.0));
        let p = world.player_mut(id).unwrap();
        Perturbation::Pull { range: 100.0, strength: 4.0 }.apply(p, Vec2::new(100.0, 100.0), 50.0);
        assert_eq!(p.drift, Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn test_repel_pushes_away() {
        let (mut world, id) = player_at(Vec2::new(150.0, 100.0));
        let p = world.player_mut(id).unwrap();
        Perturbation::Repel { range: 100.0, strength: 4.0 }.apply(p, Vec2::new(100.0, 100.0), 50.0);
        assert_eq!(p.drift, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let (mut world, id) = player_at(Vec2::new(400.0, 100.0));
        let p = world.player_mut(id).unwrap();
        Perturbation::Pull { range: 100.0, strength: 4.0 }.apply(p, Vec2::new(100.0, 100.0), 300.0);
        Perturbation::Damp { range: 100.0, factor: 0.5 }.apply(p, Vec2::new(100.0, 100.0), 300.0);
        assert_eq!(p.drift, Vec2::ZERO);
        assert_eq!(p.speed_factor, 1.0);
    }

    #[test]
    fn test_damp_keeps_strongest() {
        let (mut world, id) = player_at(Vec2::new(100.0, 100.0));
        let p = world.player_mut(id).unwrap();
        Perturbation::Damp { range: 100.0, factor: 0.3 }.apply(p, Vec2::new(100.0, 100.0), 0.0);
        Perturbation::Damp { range: 100.0, factor: 0.5 }.apply(p, Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(p.speed_factor, 0.3);
    }
}
