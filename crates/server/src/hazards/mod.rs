//! Size-gated environmental hazards.
//!
//! Each [`HazardSet`] watches one size band. It is inactive (no hazards at
//! all) until a living player's size enters the band, then its layout
//! creates a fresh set of hazards. When the band empties again everything
//! is torn down. Hazards only ever touch alive, normal-state players whose
//! size lies inside the set's band.

pub mod effect;
pub mod layout;
pub mod motion;

use crate::config::HazardsConfig;
use crate::entity::{PlayerId, PlayerState};
use crate::level::{SizeBand, Tiers};
use crate::world::World;
use effect::Effect;
use glam::Vec2;
use layout::{ClassicLayout, HazardLayout, OrbitalLayout, Spawner};
use motion::Motion;
use protocol::{HazardKind, HazardRecord, HazardSnapshot};
use rand::rngs::StdRng;
use tracing::{debug, info};

pub type HazardId = u32;

/// A single hazard object.
#[derive(Debug, Clone)]
pub struct Hazard {
    pub id: HazardId,
    pub kind: HazardKind,
    pub position: Vec2,
    pub radius: f32,
    pub motion: Motion,
    /// Applied in order; a kill stops the rest.
    pub effects: Vec<Effect>,
    /// Consumed this tick; dropped at the end of the effect pass.
    spent: bool,
}

impl Hazard {
    pub fn record(&self) -> HazardRecord {
        HazardRecord {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
        }
    }
}

/// What a hazard did to a player, reported back to the game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardOutcome {
    Killed { player: PlayerId, cause: HazardKind },
    Teleported { player: PlayerId, to: Vec2 },
    Struck { player: PlayerId },
}

enum SetState {
    Inactive,
    Active { hazards: Vec<Hazard> },
}

/// One band-gated group of hazards driven by a layout.
pub struct HazardSet {
    band: SizeBand,
    layout: Box<dyn HazardLayout>,
    state: SetState,
}

impl HazardSet {
    pub fn new(band: SizeBand, layout: Box<dyn HazardLayout>) -> Self {
        Self {
            band,
            layout,
            state: SetState::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SetState::Active { .. })
    }

    pub fn hazards(&self) -> &[Hazard] {
        match &self.state {
            SetState::Active { hazards } => hazards,
            SetState::Inactive => &[],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update(
        &mut self,
        world: &mut World,
        tiers: &Tiers,
        rng: &mut StdRng,
        next_id: &mut HazardId,
        now_ms: u64,
        dt_ms: f32,
        outcomes: &mut Vec<HazardOutcome>,
    ) {
        let band = self.band;
        let border = world.border;
        let in_band = world.players().any(|p| p.alive && band.contains(p.size()));

        match (self.is_active(), in_band) {
            (false, true) => {
                let mut spawner = Spawner::new(border, rng, next_id);
                let hazards = self.layout.activate(&mut spawner, now_ms);
                info!("{} hazards activated ({} objects)", self.layout.name(), hazards.len());
                self.state = SetState::Active { hazards };
            }
            (true, false) => {
                info!("{} hazards deactivated", self.layout.name());
                self.state = SetState::Inactive;
                return;
            }
            _ => {}
        }

        let SetState::Active { hazards } = &mut self.state else {
            return;
        };

        for hazard in hazards.iter_mut() {
            hazard.motion.advance(&mut hazard.position, dt_ms);
        }
        let mut spawner = Spawner::new(border, rng, next_id);
        self.layout.on_tick(hazards, &mut spawner, now_ms);

        let affected: Vec<PlayerId> = world
            .players()
            .filter(|p| p.alive && p.state == PlayerState::Normal && band.contains(p.size()))
            .map(|p| p.id)
            .collect();

        for id in affected {
            for hazard in hazards.iter_mut() {
                if hazard.spent {
                    continue;
                }
                let Some(player) = world.player_mut(id) else {
                    break;
                };
                if !player.alive {
                    break;
                }

                let distance = player.position.distance(hazard.position);
                let overlap = distance < player.effective_radius(tiers) + hazard.radius;

                for effect in hazard.effects.iter_mut() {
                    match effect {
                        Effect::Kill if overlap => {
                            player.alive = false;
                            player.target = None;
                            outcomes.push(HazardOutcome::Killed {
                                player: id,
                                cause: hazard.kind,
                            });
                            break;
                        }
                        Effect::TeleportOnce { used_by } => {
                            if overlap && used_by.insert(id) {
                                let to = border.random_position(rng);
                                player.position = to;
                                player.target = None;
                                debug!("Player {} teleported by hazard {}", id, hazard.id);
                                outcomes.push(HazardOutcome::Teleported { player: id, to });
                            }
                        }
                        Effect::Shatter if overlap => {
                            let halved = player.size() / 2.0;
                            player.set_size(halved, tiers);
                            hazard.spent = true;
                            outcomes.push(HazardOutcome::Struck { player: id });
                            break;
                        }
                        Effect::Perturb(field) => field.apply(player, hazard.position, distance),
                        _ => {}
                    }
                }
            }
        }

        hazards.retain(|h| !h.spent);
    }
}

/// Every hazard set in the world.
pub struct HazardSubsystem {
    sets: Vec<HazardSet>,
    next_id: HazardId,
}

impl HazardSubsystem {
    /// Classic and orbital sets from configuration.
    pub fn new(config: &HazardsConfig) -> Self {
        Self::with_sets(vec![
            HazardSet::new(
                config.classic.band,
                Box::new(ClassicLayout::new(config.classic.clone())),
            ),
            HazardSet::new(
                config.orbital.band,
                Box::new(OrbitalLayout::new(config.orbital.clone())),
            ),
        ])
    }

    pub fn with_sets(sets: Vec<HazardSet>) -> Self {
        Self { sets, next_id: 1 }
    }

    pub fn sets(&self) -> &[HazardSet] {
        &self.sets
    }

    /// Reset injected drift, then run every set for one tick.
    pub fn update(
        &mut self,
        world: &mut World,
        tiers: &Tiers,
        rng: &mut StdRng,
        now_ms: u64,
        dt_ms: f32,
    ) -> Vec<HazardOutcome> {
        for player in world.players_mut() {
            player.drift = Vec2::ZERO;
            player.speed_factor = 1.0;
        }

        let mut outcomes = Vec::new();
        for set in &mut self.sets {
            set.update(world, tiers, rng, &mut self.next_id, now_ms, dt_ms, &mut outcomes);
        }
        outcomes
    }

    /// Client-facing view of all active hazards.
    pub fn snapshot(&self) -> HazardSnapshot {
        let mut snapshot = HazardSnapshot::default();
        for hazard in self.sets.iter().flat_map(|s| s.hazards()) {
            let record = hazard.record();
            match hazard.kind {
                HazardKind::BlackHole => snapshot.black_hole = Some(record),
                HazardKind::WhiteHole => snapshot.white_hole = Some(record),
                HazardKind::Asteroid => snapshot.asteroids.push(record),
                HazardKind::OrbitalBlackHole | HazardKind::Quasar | HazardKind::DarkMatter => {
                    snapshot.orbital.push(record)
                }
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entity::{NewPlayer, PlayerKind};
    use rand::SeedableRng;

    struct Fixture {
        world: World,
        tiers: Tiers,
        hazards: HazardSubsystem,
        rng: StdRng,
        now: u64,
    }

    impl Fixture {
        fn new() -> Self {
            let config = Config::default();
            Self {
                world: World::new(config.world.width, config.world.height),
                tiers: config.tiers(),
                hazards: HazardSubsystem::new(&config.hazards),
                rng: StdRng::seed_from_u64(42),
                now: 0,
            }
        }

        fn spawn(&mut self, pos: Vec2, size: f32) -> PlayerId {
            self.world.spawn_player(
                NewPlayer {
                    kind: PlayerKind::Human,
                    name: "h".into(),
                    position: pos,
                    size,
                    state: PlayerState::Normal,
                },
                &self.tiers,
                self.now,
            )
        }

        fn tick(&mut self) -> Vec<HazardOutcome> {
            self.now += 50;
            self.hazards.update(&mut self.world, &self.tiers, &mut self.rng, self.now, 0.0)
        }

        fn classic(&mut self) -> &mut Vec<Hazard> {
            match &mut self.hazards.sets[0].state {
                SetState::Active { hazards } => hazards,
                SetState::Inactive => panic!("classic set inactive"),
            }
        }
    }

    #[test]
    fn test_activation_follows_band() {
        let mut f = Fixture::new();
        let id = f.spawn(Vec2::new(10.0, 10.0), 20.0);
        f.tick();
        let snap = f.hazards.snapshot();
        assert!(snap.is_empty());
        assert!(snap.black_hole.is_none() && snap.white_hole.is_none());

        let tiers = f.tiers.clone();
        f.world.player_mut(id).unwrap().set_size(150.0, &tiers);
        f.tick();
        let snap = f.hazards.snapshot();
        assert!(snap.black_hole.is_some());
        assert!(snap.white_hole.is_some());
        assert!(snap.orbital.is_empty());
    }

    #[test]
    fn test_teardown_and_fresh_layout() {
        let mut f = Fixture::new();
        let id = f.spawn(Vec2::new(10.0, 10.0), 150.0);
        f.tick();
        let first = f.hazards.snapshot().black_hole.unwrap();

        let tiers = f.tiers.clone();
        f.world.player_mut(id).unwrap().set_size(20.0, &tiers);
        f.tick();
        assert!(f.hazards.snapshot().is_empty());
        assert!(!f.hazards.sets()[0].is_active());

        f.world.player_mut(id).unwrap().set_size(150.0, &tiers);
        f.tick();
        let second = f.hazards.snapshot().black_hole.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_black_hole_kills() {
        let mut f = Fixture::new();
        let id = f.spawn(Vec2::new(10.0, 10.0), 150.0);
        f.tick();
        let hole = f.hazards.snapshot().black_hole.unwrap();
        f.world.player_mut(id).unwrap().position = Vec2::new(hole.x, hole.y);

        let outcomes = f.tick();
        assert_eq!(
            outcomes,
            vec![HazardOutcome::Killed {
                player: id,
                cause: HazardKind::BlackHole
            }]
        );
        assert!(!f.world.player(id).unwrap().alive);
    }

    #[test]
    fn test_white_hole_used_once() {
        let mut f = Fixture::new();
        let id = f.spawn(Vec2::new(10.0, 10.0), 150.0);
        f.tick();
        let hole = f.hazards.snapshot().white_hole.unwrap();
        let on_hole = Vec2::new(hole.x, hole.y);

        f.world.player_mut(id).unwrap().position = on_hole;
        let outcomes = f.tick();
        assert!(matches!(outcomes[..], [HazardOutcome::Teleported { player, .. }] if player == id));

        f.world.player_mut(id).unwrap().position = on_hole;
        assert!(f.tick().is_empty());
        assert_eq!(f.world.player(id).unwrap().position, on_hole);
    }

    #[test]
    fn test_asteroid_halves_first_contact_only() {
        let mut f = Fixture::new();
        let spot = Vec2::new(10.0, 10.0);
        let a = f.spawn(spot, 200.0);
        let b = f.spawn(spot, 200.0);
        f.tick();

        let mut next_id = 1000;
        let mut rng = StdRng::seed_from_u64(0);
        let border = f.world.border;
        let asteroid = Spawner::new(border, &mut rng, &mut next_id).spawn(
            HazardKind::Asteroid,
            spot,
            20.0,
            Motion::Kinematic { velocity: Vec2::ZERO },
            vec![Effect::Shatter],
        );
        f.classic().push(asteroid);

        let outcomes = f.tick();
        assert_eq!(outcomes, vec![HazardOutcome::Struck { player: a }]);
        assert_eq!(f.world.player(a).unwrap().size(), 100.0);
        assert_eq!(f.world.player(b).unwrap().size(), 200.0);
        assert!(f.hazards.snapshot().asteroids.is_empty());
    }

    #[test]
    fn test_hazards_ignore_players_outside_band() {
        let mut f = Fixture::new();
        let orbiter = f.spawn(Vec2::ZERO, 300.0);
        let classic = f.spawn(Vec2::new(10.0, 0.0), 150.0);
        f.tick();

        let hole = f.hazards.snapshot().orbital[0].clone();
        assert_eq!(hole.kind, HazardKind::OrbitalBlackHole);
        let center = Vec2::new(hole.x, hole.y);
        f.world.player_mut(orbiter).unwrap().position = center + Vec2::new(150.0, 0.0);
        f.world.player_mut(classic).unwrap().position = center + Vec2::new(0.0, 150.0);

        f.tick();
        assert!(f.world.player(orbiter).unwrap().drift.length() > 0.0);
        assert_eq!(f.world.player(classic).unwrap().drift, Vec2::ZERO);
    }

    #[test]
    fn test_frozen_players_are_ignored() {
        let mut f = Fixture::new();
        let id = f.spawn(Vec2::new(10.0, 10.0), 150.0);
        f.tick();
        let hole = f.hazards.snapshot().black_hole.unwrap();
        {
            let p = f.world.player_mut(id).unwrap();
            p.position = Vec2::new(hole.x, hole.y);
            p.state = PlayerState::Frozen { regrown: 0.0 };
        }
        assert!(f.tick().is_empty());
        assert!(f.world.player(id).unwrap().alive);
    }
}
