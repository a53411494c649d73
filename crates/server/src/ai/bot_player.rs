use crate::config::Config;
use crate::entity::{PlayerId, PlayerState};
use crate::world::World;
use glam::Vec2;
use rand::Rng;
use rand::rngs::StdRng;

/// Bot names to use.
const BOT_NAMES: &[&str] = &[
    "Nova", "Pulsar", "Comet", "Nebula", "Quark", "Photon", "Vega", "Orion",
    "Sirius", "Lyra", "Draco", "Halley", "Kepler", "Rigel", "Zenith", "Aurora",
];

/// A bot player controlled by AI.
#[derive(Debug)]
pub struct Bot {
    /// Id of the player this bot drives.
    pub id: PlayerId,
    /// Simulation time (ms) at which a dead bot comes back.
    pub respawn_at: Option<u64>,
}

impl Bot {
    pub fn new(id: PlayerId) -> Self {
        Self { id, respawn_at: None }
    }

    /// Pick a display name from the fixed list with a numeric suffix.
    pub fn random_name(rng: &mut StdRng) -> String {
        let name = BOT_NAMES[rng.random_range(0..BOT_NAMES.len())];
        format!("{}{}", name, rng.random_range(1..100))
    }

    /// Choose this tick's target. Bots that are dead or not in the normal
    /// state are left alone.
    pub fn update(&self, world: &mut World, config: &Config, rng: &mut StdRng) {
        let (pos, size, mut target) = match world.player(self.id) {
            Some(p) if p.alive && p.state == PlayerState::Normal => {
                (p.position, p.size(), p.target)
            }
            _ => return,
        };
        let border = world.border;
        let bots = &config.bots;

        if rng.random_bool(bots.wander_chance.clamp(0.0, 1.0)) {
            target = Some(border.random_position(rng));
        }

        if let Some(orb) = nearest_orb(world, pos, bots.orb_seek_radius) {
            if rng.random_bool(bots.orb_seek_chance.clamp(0.0, 1.0)) {
                target = Some(orb);
            }
        }

        let threat_size = size * config.player.eat_threshold;
        if let Some(threat) = nearest_threat(world, self.id, pos, threat_size, bots.threat_radius) {
            let away = (pos - threat).try_normalize().unwrap_or(Vec2::X);
            target = Some(border.clamp(pos + away * bots.flee_distance));
        }

        if target.is_none() {
            target = Some(border.random_position(rng));
        }

        if let Some(p) = world.player_mut(self.id) {
            p.target = target;
        }
    }
}

/// Position of the closest orb within `radius`.
fn nearest_orb(world: &World, pos: Vec2, radius: f32) -> Option<Vec2> {
    world
        .orbs()
        .map(|o| (o.position, o.position.distance_squared(pos)))
        .filter(|&(_, d2)| d2 <= radius * radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

/// Position of the closest living player within `radius` larger than `min_size`.
fn nearest_threat(
    world: &World,
    me: PlayerId,
    pos: Vec2,
    min_size: f32,
    radius: f32,
) -> Option<Vec2> {
    world
        .players()
        .filter(|p| p.id != me && p.alive && p.size() > min_size)
        .map(|p| (p.position, p.position.distance_squared(pos)))
        .filter(|&(_, d2)| d2 <= radius * radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NewPlayer, PlayerKind};
    use crate::level::Tiers;
    use rand::SeedableRng;

    fn setup() -> (World, Tiers, Config) {
        let mut config = Config::default();
        config.bots.wander_chance = 0.0;
        config.bots.orb_seek_chance = 1.0;
        let tiers = config.tiers();
        (World::new(2000.0, 2000.0), tiers, config)
    }

    fn spawn(world: &mut World, tiers: &Tiers, kind: PlayerKind, pos: Vec2, size: f32) -> PlayerId {
        world.spawn_player(
            NewPlayer {
                kind,
                name: "b".into(),
                position: pos,
                size,
                state: PlayerState::Normal,
            },
            tiers,
            0,
        )
    }

    #[test]
    fn test_bot_names_have_suffix() {
        let mut rng = StdRng::seed_from_u64(5);
        let name = Bot::random_name(&mut rng);
        assert!(name.chars().last().unwrap().is_ascii_digit());
        assert!(BOT_NAMES.iter().any(|n| name.starts_with(n)));
    }

    #[test]
    fn test_bot_seeks_nearby_orb() {
        let (mut world, tiers, config) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        let id = spawn(&mut world, &tiers, PlayerKind::Bot, Vec2::new(1000.0, 1000.0), 20.0);
        world.insert_orb_at(Vec2::new(1100.0, 1000.0), 5.0);
        world.insert_orb_at(Vec2::new(1050.0, 1000.0), 5.0);

        Bot::new(id).update(&mut world, &config, &mut rng);
        assert_eq!(world.player(id).unwrap().target, Some(Vec2::new(1050.0, 1000.0)));
    }

    #[test]
    fn test_bot_flees_bigger_player() {
        let (mut world, tiers, config) = setup();
        let mut rng = StdRng::seed_from_u64(2);
        let id = spawn(&mut world, &tiers, PlayerKind::Bot, Vec2::new(1000.0, 1000.0), 20.0);
        world.insert_orb_at(Vec2::new(1050.0, 1000.0), 5.0);
        spawn(&mut world, &tiers, PlayerKind::Human, Vec2::new(900.0, 1000.0), 80.0);

        Bot::new(id).update(&mut world, &config, &mut rng);
        let target = world.player(id).unwrap().target.unwrap();
        assert!((target - Vec2::new(1000.0 + config.bots.flee_distance, 1000.0)).length() < 1e-3);
    }

    #[test]
    fn test_bot_without_target_wanders() {
        let (mut world, tiers, config) = setup();
        let mut rng = StdRng::seed_from_u64(3);
        let id = spawn(&mut world, &tiers, PlayerKind::Bot, Vec2::new(1000.0, 1000.0), 20.0);

        Bot::new(id).update(&mut world, &config, &mut rng);
        let target = world.player(id).unwrap().target.unwrap();
        assert!(target.x >= 0.0 && target.x <= 2000.0);
        assert!(target.y >= 0.0 && target.y <= 2000.0);
    }

    #[test]
    fn test_frozen_bot_is_left_alone() {
        let (mut world, tiers, config) = setup();
        let mut rng = StdRng::seed_from_u64(4);
        let id = spawn(&mut world, &tiers, PlayerKind::Bot, Vec2::new(1000.0, 1000.0), 20.0);
        world.player_mut(id).unwrap().state = PlayerState::Frozen { regrown: 0.0 };

        Bot::new(id).update(&mut world, &config, &mut rng);
        assert_eq!(world.player(id).unwrap().target, None);
    }
}
