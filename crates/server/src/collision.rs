//! Collision detection and resolution.
//!
//! This module handles:
//! - Orb consumption (grow, remove, respawn one replacement)
//! - Player-vs-player eating
//!
//! All tests use effective radii, never raw sizes.

use crate::config::Config;
use crate::entity::{OrbId, PlayerId};
use crate::level::Tiers;
use crate::world::World;
use fixedbitset::FixedBitSet;
use glam::Vec2;
use rand::rngs::StdRng;

/// Upper bound on the configured eat threshold.
pub const MAX_EAT_MULT: f32 = 1.05;

/// Result of checking collision between two circles.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Combined radius of both circles
    pub r: f32,
    /// Actual distance
    pub d: f32,
}

impl CollisionResult {
    /// Check if the circles actually overlap.
    #[inline]
    pub fn is_colliding(&self) -> bool {
        self.d < self.r
    }
}

/// Check collision between two circles.
#[inline]
pub fn check_collision(
    pos: Vec2,
    radius: f32,
    other_pos: Vec2,
    other_radius: f32,
) -> CollisionResult {
    CollisionResult {
        r: radius + other_radius,
        d: pos.distance(other_pos),
    }
}

/// Whether a player of effective radius `eater` may eat one of radius
/// `target`. The threshold is capped at [`MAX_EAT_MULT`].
#[inline]
pub fn can_eat(eater: f32, target: f32, threshold: f32) -> bool {
    eater >= target * threshold.min(MAX_EAT_MULT)
}

/// One orb eaten this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbEaten {
    pub player: PlayerId,
    pub orb: OrbId,
    pub replacement: OrbId,
}

/// One player eaten this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    pub eater: PlayerId,
    pub victim: PlayerId,
}

/// Let every living player eat the orbs it overlaps.
pub fn resolve_orb_collisions(
    world: &mut World,
    tiers: &Tiers,
    config: &Config,
    rng: &mut StdRng,
) -> Vec<OrbEaten> {
    let mut eaten = Vec::new();
    let mut hits: Vec<OrbId> = Vec::new();

    for id in world.player_ids() {
        let (pos, radius) = match world.player(id) {
            Some(p) if p.alive => (p.position, p.effective_radius(tiers)),
            _ => continue,
        };

        hits.clear();
        hits.extend(
            world
                .orbs()
                .filter(|o| check_collision(pos, radius, o.position, o.size).is_colliding())
                .map(|o| o.id),
        );

        for &orb in &hits {
            let Some(replacement) = world.replace_orb(orb, rng) else {
                continue;
            };
            if let Some(p) = world.player_mut(id) {
                p.grow(config.orbs.growth, tiers);
            }
            eaten.push(OrbEaten {
                player: id,
                orb,
                replacement,
            });
        }
    }

    eaten
}

/// Resolve eating between every unordered pair of living players.
///
/// A player eaten earlier in the pass takes no further part in it. Victims
/// are left in the world with `alive == false`; the caller decides between
/// respawn and removal.
pub fn resolve_player_collisions(world: &mut World, tiers: &Tiers, config: &Config) -> Vec<Kill> {
    struct Candidate {
        id: PlayerId,
        position: Vec2,
        radius: f32,
    }

    let mut candidates: Vec<Candidate> = world
        .players()
        .filter(|p| p.alive)
        .map(|p| Candidate {
            id: p.id,
            position: p.position,
            radius: p.effective_radius(tiers),
        })
        .collect();

    let threshold = config.player.eat_threshold;
    let inflation = config.player.contact_inflation;
    let mut consumed = FixedBitSet::with_capacity(candidates.len());
    let mut kills = Vec::new();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if consumed.contains(i) {
                break;
            }
            if consumed.contains(j) {
                continue;
            }

            let (a, b) = (&candidates[i], &candidates[j]);
            let contact = check_collision(
                a.position,
                a.radius * inflation,
                b.position,
                b.radius * inflation,
            );
            if !contact.is_colliding() {
                continue;
            }

            let (eater, victim) = if can_eat(a.radius, b.radius, threshold) {
                (i, j)
            } else if can_eat(b.radius, a.radius, threshold) {
                (j, i)
            } else {
                continue;
            };

            let (eater_id, victim_id) = (candidates[eater].id, candidates[victim].id);
            let victim_size = match world.player_mut(victim_id) {
                Some(p) => {
                    p.alive = false;
                    p.target = None;
                    p.size()
                }
                None => continue,
            };
            if let Some(p) = world.player_mut(eater_id) {
                p.grow(victim_size * config.player.eat_growth_fraction, tiers);
                candidates[eater].radius = p.effective_radius(tiers);
            }

            consumed.insert(victim);
            kills.push(Kill {
                eater: eater_id,
                victim: victim_id,
            });
        }
    }

    kills
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NewPlayer, PlayerKind, PlayerState};
    use crate::level::LevelBand;
    use rand::SeedableRng;

    fn setup() -> (World, Tiers, Config) {
        let mut config = Config::default();
        config.levels = vec![LevelBand { key: "open".into(), min: 0.0, max: 1.0e9 }];
        config.player.eat_threshold = 1.1;
        let tiers = config.tiers();
        (World::new(1000.0, 1000.0), tiers, config)
    }

    /// Spawn a player at the base size, then grow it to `radius` without
    /// leaving the single open tier.
    fn spawn(world: &mut World, tiers: &Tiers, pos: Vec2, radius: f32) -> PlayerId {
        let id = world.spawn_player(
            NewPlayer {
                kind: PlayerKind::Human,
                name: "c".into(),
                position: pos,
                size: tiers.base_radius,
                state: PlayerState::Normal,
            },
            tiers,
            0,
        );
        world.player_mut(id).unwrap().grow(radius - tiers.base_radius, tiers);
        id
    }

    #[test]
    fn test_collision_check() {
        let result = check_collision(Vec2::new(0.0, 0.0), 50.0, Vec2::new(30.0, 0.0), 20.0);
        assert!(result.is_colliding());
        assert_eq!(result.d, 30.0);
    }

    #[test]
    fn test_no_collision() {
        let result = check_collision(Vec2::new(0.0, 0.0), 10.0, Vec2::new(100.0, 0.0), 10.0);
        assert!(!result.is_colliding());
    }

    #[test]
    fn test_can_eat_threshold_is_capped() {
        assert!(can_eat(22.0, 20.0, 1.1));
        assert!(!can_eat(20.9, 20.0, 1.1));
        // Below the cap the configured threshold applies as-is.
        assert!(can_eat(20.4, 20.0, 1.02));
        assert!(!can_eat(20.0, 20.0, 1.02));
    }

    #[test]
    fn test_orb_eat_scenario() {
        let (mut world, tiers, config) = setup();
        let mut rng = StdRng::seed_from_u64(3);
        let id = spawn(&mut world, &tiers, Vec2::new(500.0, 500.0), 20.0);
        let orb = world.insert_orb_at(Vec2::new(510.0, 500.0), 5.0);
        assert_eq!(world.orb_count(), 1);

        let eaten = resolve_orb_collisions(&mut world, &tiers, &config, &mut rng);
        assert_eq!(eaten.len(), 1);
        assert_eq!(eaten[0].orb, orb);

        let p = world.player(id).unwrap();
        assert_eq!(p.size(), 21.0);
        assert_eq!(p.level_entry_size(), 20.0);
        assert!(world.orb(orb).is_none());
        assert_eq!(world.orb_count(), 1);
        assert!(world.orb(eaten[0].replacement).is_some());
    }

    #[test]
    fn test_orb_count_conserved_over_many_passes() {
        let (mut world, tiers, config) = setup();
        let mut rng = StdRng::seed_from_u64(11);
        world.fill_orbs(300, 5.0, &mut rng);
        for x in 0..10 {
            spawn(&mut world, &tiers, Vec2::new(50.0 + x as f32 * 90.0, 500.0), 30.0);
        }
        for _ in 0..20 {
            resolve_orb_collisions(&mut world, &tiers, &config, &mut rng);
            assert_eq!(world.orb_count(), 300);
        }
    }

    #[test]
    fn test_bigger_player_eats_smaller() {
        let (mut world, tiers, config) = setup();
        let big = spawn(&mut world, &tiers, Vec2::new(100.0, 100.0), 22.0);
        let small = spawn(&mut world, &tiers, Vec2::new(120.0, 100.0), 20.0);

        let kills = resolve_player_collisions(&mut world, &tiers, &config);
        assert_eq!(kills, vec![Kill { eater: big, victim: small }]);
        assert!(!world.player(small).unwrap().alive);
        assert_eq!(world.player(big).unwrap().size(), 32.0);
    }

    #[test]
    fn test_near_equal_players_bounce_off() {
        let (mut world, tiers, config) = setup();
        let a = spawn(&mut world, &tiers, Vec2::new(100.0, 100.0), 20.9);
        let b = spawn(&mut world, &tiers, Vec2::new(110.0, 100.0), 20.0);
        assert!(resolve_player_collisions(&mut world, &tiers, &config).is_empty());
        assert!(world.player(a).unwrap().alive);
        assert!(world.player(b).unwrap().alive);
    }

    #[test]
    fn test_victim_cannot_eat_later_in_same_pass() {
        let (mut world, tiers, config) = setup();
        let huge = spawn(&mut world, &tiers, Vec2::new(100.0, 100.0), 60.0);
        let mid = spawn(&mut world, &tiers, Vec2::new(130.0, 100.0), 30.0);
        let tiny = spawn(&mut world, &tiers, Vec2::new(160.0, 100.0), 10.0);

        let kills = resolve_player_collisions(&mut world, &tiers, &config);
        assert!(kills.iter().all(|k| k.eater == huge));
        assert!(kills.iter().any(|k| k.victim == mid));
        assert!(!kills.iter().any(|k| k.eater == mid));
        assert!(world.player(huge).unwrap().alive);
        assert!(!world.player(tiny).unwrap().alive);
    }

    #[test]
    fn test_far_apart_players_do_not_interact() {
        let (mut world, tiers, config) = setup();
        spawn(&mut world, &tiers, Vec2::new(100.0, 100.0), 60.0);
        spawn(&mut world, &tiers, Vec2::new(900.0, 900.0), 10.0);
        assert!(resolve_player_collisions(&mut world, &tiers, &config).is_empty());
    }
}
