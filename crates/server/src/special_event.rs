//! The gravitational pull: a one-shot, server-wide special event.
//!
//! `Idle -> Active -> Finished`, never restarted within one process.

use crate::config::Config;
use crate::entity::{NewPlayer, PlayerId, PlayerKind, PlayerState};
use crate::level::Tiers;
use crate::world::World;
use glam::Vec2;
use thiserror::Error;
use tracing::info;

/// Names given to the helper bots spawned around the rally point.
const HELPER_NAMES: [&str; 4] = ["Graviton I", "Graviton II", "Graviton III", "Graviton IV"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventPhase {
    Idle,
    Active { center: Vec2, ends_at_ms: u64 },
    Finished,
}

/// Why a trigger request was refused.
#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    #[error("The gravitational pull has already happened")]
    AlreadyTriggered,

    #[error("Player {0} is not eligible to trigger the gravitational pull")]
    NotEligible(PlayerId),
}

#[derive(Debug)]
pub struct SpecialEvent {
    phase: EventPhase,
    helpers: Vec<PlayerId>,
}

impl Default for SpecialEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecialEvent {
    pub fn new() -> Self {
        Self {
            phase: EventPhase::Idle,
            helpers: Vec::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, EventPhase::Active { .. })
    }

    /// Anchored helper bots spawned when the event started.
    pub fn helpers(&self) -> &[PlayerId] {
        &self.helpers
    }

    /// Start the event on behalf of `requester`, whose size is checked
    /// here rather than trusted. Returns the rally point.
    pub fn try_start(
        &mut self,
        requester: PlayerId,
        world: &mut World,
        tiers: &Tiers,
        config: &Config,
        now_ms: u64,
    ) -> Result<Vec2, EventError> {
        if self.phase != EventPhase::Idle {
            return Err(EventError::AlreadyTriggered);
        }
        let origin = match world.player(requester) {
            Some(p) if p.alive && p.size() >= config.special_event.size_threshold => p.position,
            _ => return Err(EventError::NotEligible(requester)),
        };

        let event = &config.special_event;
        let center = rally_point(origin, world, event.helper_offset);
        let offsets = [
            Vec2::new(event.helper_offset, 0.0),
            Vec2::new(-event.helper_offset, 0.0),
            Vec2::new(0.0, event.helper_offset),
            Vec2::new(0.0, -event.helper_offset),
        ];

        pull_normal_players(world);

        for (name, offset) in HELPER_NAMES.iter().zip(offsets) {
            let spec = NewPlayer {
                kind: PlayerKind::Bot,
                name: name.to_string(),
                position: center + offset,
                size: event.helper_size,
                state: PlayerState::Anchored,
            };
            self.helpers.push(world.spawn_player(spec, tiers, now_ms));
        }

        self.phase = EventPhase::Active {
            center,
            ends_at_ms: now_ms + event.duration_ms,
        };
        info!(
            "Gravitational pull started by player {} at ({:.0}, {:.0})",
            requester, center.x, center.y
        );
        Ok(center)
    }

    /// Drag pulled players, end the event on time and regrow frozen players.
    /// Players that joined or respawned since the start are pulled too.
    pub fn update(
        &mut self,
        world: &mut World,
        tiers: &Tiers,
        config: &Config,
        now_ms: u64,
        dt_ms: f32,
    ) {
        let event = &config.special_event;

        if let EventPhase::Active { center, ends_at_ms } = self.phase {
            if now_ms >= ends_at_ms {
                for player in world.players_mut() {
                    if player.state == PlayerState::Pulled {
                        player.state = PlayerState::Frozen { regrown: 0.0 };
                    }
                }
                self.phase = EventPhase::Finished;
                info!("Gravitational pull ended");
            } else {
                pull_normal_players(world);
                let step = event.pull_speed * dt_ms / config.player.reference_frame_ms;
                for player in world.players_mut() {
                    if !player.alive || player.state != PlayerState::Pulled {
                        continue;
                    }
                    let offset = center - player.position;
                    let dist = offset.length();
                    if dist <= step {
                        player.position = center;
                    } else {
                        player.position += offset / dist * step;
                    }
                    if player.position.distance(center) <= event.stop_radius {
                        player.state = PlayerState::Frozen { regrown: 0.0 };
                    }
                }
            }
        }

        let budget = event.regrow_per_second * dt_ms / 1000.0;
        for player in world.players_mut() {
            let PlayerState::Frozen { regrown } = player.state else {
                continue;
            };
            if !player.alive || regrown >= event.max_regrowth {
                continue;
            }
            let amount = budget.min(event.max_regrowth - regrown);
            player.grow(amount, tiers);
            player.state = PlayerState::Frozen {
                regrown: regrown + amount,
            };
        }
    }
}

/// Hand every alive, normal-state player over to the pull.
fn pull_normal_players(world: &mut World) {
    for player in world.players_mut() {
        if player.alive && player.state == PlayerState::Normal {
            player.state = PlayerState::Pulled;
            player.target = None;
        }
    }
}

/// Requester position pulled `margin` away from every edge (centre of the
/// world on an axis too small for the margin).
fn rally_point(origin: Vec2, world: &World, margin: f32) -> Vec2 {
    let axis = |value: f32, extent: f32| {
        if extent > margin * 2.0 {
            value.clamp(margin, extent - margin)
        } else {
            extent / 2.0
        }
    };
    Vec2::new(
        axis(origin.x, world.border.width),
        axis(origin.y, world.border.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (World, Tiers, Config) {
        let config = Config::default();
        let tiers = config.tiers();
        (World::new(config.world.width, config.world.height), tiers, config)
    }

    fn spawn(world: &mut World, tiers: &Tiers, pos: Vec2, size: f32) -> PlayerId {
        world.spawn_player(
            NewPlayer {
                kind: PlayerKind::Human,
                name: "s".into(),
                position: pos,
                size,
                state: PlayerState::Normal,
            },
            tiers,
            0,
        )
    }

    #[test]
    fn test_rejects_small_requester() {
        let (mut world, tiers, config) = setup();
        let id = spawn(&mut world, &tiers, Vec2::new(500.0, 500.0), 599.0);
        let mut event = SpecialEvent::new();
        assert_eq!(
            event.try_start(id, &mut world, &tiers, &config, 0),
            Err(EventError::NotEligible(id))
        );
        assert_eq!(event.phase(), EventPhase::Idle);
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_start_spawns_helpers_and_pulls_everyone() {
        let (mut world, tiers, config) = setup();
        let big = spawn(&mut world, &tiers, Vec2::new(10.0, 10.0), 700.0);
        let other = spawn(&mut world, &tiers, Vec2::new(3000.0, 3000.0), 20.0);
        let mut event = SpecialEvent::new();

        let center = event.try_start(big, &mut world, &tiers, &config, 1_000).unwrap();
        assert_eq!(center, Vec2::new(250.0, 250.0));
        assert!(event.is_active());
        assert_eq!(event.helpers().len(), 4);
        for &helper in event.helpers() {
            let p = world.player(helper).unwrap();
            assert_eq!(p.state, PlayerState::Anchored);
            assert!(p.is_bot());
            let offset = p.position.distance(center);
            assert!((offset - config.special_event.helper_offset).abs() < 1e-3);
        }
        assert_eq!(world.player(big).unwrap().state, PlayerState::Pulled);
        assert_eq!(world.player(other).unwrap().state, PlayerState::Pulled);

        assert_eq!(
            event.try_start(big, &mut world, &tiers, &config, 1_000),
            Err(EventError::AlreadyTriggered)
        );
    }

    #[test]
    fn test_pulled_player_freezes_near_center() {
        let (mut world, tiers, config) = setup();
        let big = spawn(&mut world, &tiers, Vec2::new(1000.0, 1000.0), 700.0);
        let near = spawn(&mut world, &tiers, Vec2::new(1160.0, 1000.0), 20.0);
        let mut event = SpecialEvent::new();
        event.try_start(big, &mut world, &tiers, &config, 0).unwrap();

        event.update(&mut world, &tiers, &config, 50, 50.0);
        let p = world.player(near).unwrap();
        assert!(p.position.x < 1160.0);
        assert!(matches!(p.state, PlayerState::Frozen { .. }));
        // The requester sits on the rally point.
        assert!(matches!(world.player(big).unwrap().state, PlayerState::Frozen { .. }));
    }

    #[test]
    fn test_late_joiner_is_pulled_while_active() {
        let (mut world, tiers, config) = setup();
        let big = spawn(&mut world, &tiers, Vec2::new(1000.0, 1000.0), 700.0);
        let mut event = SpecialEvent::new();
        event.try_start(big, &mut world, &tiers, &config, 0).unwrap();

        let late = spawn(&mut world, &tiers, Vec2::new(3000.0, 1000.0), 20.0);
        world.player_mut(late).unwrap().target = Some(Vec2::new(3900.0, 1000.0));
        event.update(&mut world, &tiers, &config, 50, 50.0);

        let p = world.player(late).unwrap();
        assert_eq!(p.state, PlayerState::Pulled);
        assert_eq!(p.target, None);
        assert!(p.position.x < 3000.0);
        for &helper in event.helpers() {
            assert_eq!(world.player(helper).unwrap().state, PlayerState::Anchored);
        }
    }

    #[test]
    fn test_event_end_freezes_remaining_and_never_restarts() {
        let (mut world, tiers, config) = setup();
        let big = spawn(&mut world, &tiers, Vec2::new(1000.0, 1000.0), 700.0);
        let far = spawn(&mut world, &tiers, Vec2::new(3900.0, 3900.0), 20.0);
        let mut event = SpecialEvent::new();
        event.try_start(big, &mut world, &tiers, &config, 0).unwrap();

        event.update(&mut world, &tiers, &config, 50, 50.0);
        assert_eq!(world.player(far).unwrap().state, PlayerState::Pulled);

        event.update(&mut world, &tiers, &config, config.special_event.duration_ms, 50.0);
        assert_eq!(event.phase(), EventPhase::Finished);
        assert!(matches!(world.player(far).unwrap().state, PlayerState::Frozen { .. }));
        assert_eq!(
            event.try_start(big, &mut world, &tiers, &config, 20_000),
            Err(EventError::AlreadyTriggered)
        );

        let after = spawn(&mut world, &tiers, Vec2::new(500.0, 500.0), 20.0);
        event.update(&mut world, &tiers, &config, 20_050, 50.0);
        assert_eq!(world.player(after).unwrap().state, PlayerState::Normal);
    }

    #[test]
    fn test_regrowth_is_capped() {
        let (mut world, tiers, config) = setup();
        let id = spawn(&mut world, &tiers, Vec2::new(1000.0, 1000.0), 20.0);
        world.player_mut(id).unwrap().state = PlayerState::Frozen { regrown: 0.0 };
        let mut event = SpecialEvent::new();

        event.update(&mut world, &tiers, &config, 0, 1000.0);
        assert_eq!(world.player(id).unwrap().size(), 20.0 + config.special_event.regrow_per_second);

        for _ in 0..200 {
            event.update(&mut world, &tiers, &config, 0, 1000.0);
        }
        let p = world.player(id).unwrap();
        assert_eq!(p.size(), 20.0 + config.special_event.max_regrowth);
        assert_eq!(
            p.state,
            PlayerState::Frozen {
                regrown: config.special_event.max_regrowth
            }
        );
    }
}
