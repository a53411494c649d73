//! Hazard layouts: which hazards a set creates when it activates and how it
//! maintains them while active.

use super::Hazard;
use super::effect::{Effect, Perturbation};
use super::motion::{Motion, OrbitPath};
use crate::config::{ClassicHazardConfig, OrbitalHazardConfig};
use crate::world::WorldBorder;
use glam::Vec2;
use protocol::HazardKind;
use rand::Rng;
use rand::rngs::StdRng;
use std::f32::consts::TAU;

/// Attempts at placing the white hole far enough from the black hole.
const PLACEMENT_ATTEMPTS: usize = 32;

/// Hands out hazard ids and randomness to a layout.
pub struct Spawner<'a> {
    pub border: WorldBorder,
    pub rng: &'a mut StdRng,
    next_id: &'a mut u32,
}

impl<'a> Spawner<'a> {
    pub fn new(border: WorldBorder, rng: &'a mut StdRng, next_id: &'a mut u32) -> Self {
        Self {
            border,
            rng,
            next_id,
        }
    }

    /// Build a hazard with a fresh id. Orbital hazards start on their path.
    pub fn spawn(
        &mut self,
        kind: HazardKind,
        position: Vec2,
        radius: f32,
        motion: Motion,
        effects: Vec<Effect>,
    ) -> Hazard {
        let id = *self.next_id;
        *self.next_id = self.next_id.wrapping_add(1).max(1);
        let mut hazard = Hazard {
            id,
            kind,
            position,
            radius,
            motion,
            effects,
            spent: false,
        };
        hazard.motion.advance(&mut hazard.position, 0.0);
        hazard
    }
}

/// Strategy deciding a hazard set's contents.
pub trait HazardLayout: Send {
    fn name(&self) -> &'static str;

    /// Create the initial hazards. Called on every inactive -> active edge.
    fn activate(&mut self, spawner: &mut Spawner<'_>, now_ms: u64) -> Vec<Hazard>;

    /// Per-tick maintenance while active (spawning, pruning).
    fn on_tick(&mut self, _hazards: &mut Vec<Hazard>, _spawner: &mut Spawner<'_>, _now_ms: u64) {}
}

/// Black hole, white hole and a periodic asteroid stream.
pub struct ClassicLayout {
    config: ClassicHazardConfig,
    last_asteroid_ms: u64,
}

impl ClassicLayout {
    pub fn new(config: ClassicHazardConfig) -> Self {
        Self {
            config,
            last_asteroid_ms: 0,
        }
    }

    fn white_hole_position(&self, black_hole: Vec2, spawner: &mut Spawner<'_>) -> Vec2 {
        let mut best = spawner.border.random_inner_position(self.config.edge_margin, spawner.rng);
        for _ in 1..PLACEMENT_ATTEMPTS {
            if best.distance(black_hole) >= self.config.min_hole_separation {
                break;
            }
            let candidate = spawner
                .border
                .random_inner_position(self.config.edge_margin, spawner.rng);
            if candidate.distance(black_hole) > best.distance(black_hole) {
                best = candidate;
            }
        }
        best
    }

    fn spawn_asteroid(&self, spawner: &mut Spawner<'_>) -> Hazard {
        let c = &self.config;
        let corners = spawner.border.corners();
        let from = corners[spawner.rng.random_range(0..corners.len())];
        let aim = spawner.border.random_inner_position(c.edge_margin, spawner.rng);
        let speed = spawner.rng.random_range(c.asteroid_speed_min..=c.asteroid_speed_max);
        let radius = spawner.rng.random_range(c.asteroid_radius_min..=c.asteroid_radius_max);
        let velocity = (aim - from).try_normalize().unwrap_or(Vec2::X) * speed;
        spawner.spawn(
            HazardKind::Asteroid,
            from,
            radius,
            Motion::Kinematic { velocity },
            vec![Effect::Shatter],
        )
    }
}

impl HazardLayout for ClassicLayout {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn activate(&mut self, spawner: &mut Spawner<'_>, now_ms: u64) -> Vec<Hazard> {
        self.last_asteroid_ms = now_ms;

        let black = spawner.border.random_inner_position(self.config.edge_margin, spawner.rng);
        let white = self.white_hole_position(black, spawner);
        vec![
            spawner.spawn(
                HazardKind::BlackHole,
                black,
                self.config.black_hole_radius,
                Motion::Static,
                vec![Effect::Kill],
            ),
            spawner.spawn(
                HazardKind::WhiteHole,
                white,
                self.config.white_hole_radius,
                Motion::Static,
                vec![Effect::teleport_once()],
            ),
        ]
    }

    fn on_tick(&mut self, hazards: &mut Vec<Hazard>, spawner: &mut Spawner<'_>, now_ms: u64) {
        if now_ms.saturating_sub(self.last_asteroid_ms) >= self.config.asteroid_interval_ms {
            self.last_asteroid_ms = now_ms;
            hazards.push(self.spawn_asteroid(spawner));
        }

        let border = spawner.border;
        let padding = self.config.asteroid_padding;
        hazards.retain(|h| {
            h.kind != HazardKind::Asteroid || border.contains_padded(h.position, padding)
        });
    }
}

/// Orbiting black hole, quasar and dark-matter clouds around the world centre.
pub struct OrbitalLayout {
    config: OrbitalHazardConfig,
}

impl OrbitalLayout {
    pub fn new(config: OrbitalHazardConfig) -> Self {
        Self { config }
    }
}

impl HazardLayout for OrbitalLayout {
    fn name(&self) -> &'static str {
        "orbital"
    }

    fn activate(&mut self, spawner: &mut Spawner<'_>, _now_ms: u64) -> Vec<Hazard> {
        let c = &self.config;
        let center = spawner.border.center();
        let mut hazards = Vec::with_capacity(2 + c.dark_matter_count);

        let angle = spawner.rng.random_range(0.0..TAU);
        hazards.push(spawner.spawn(
            HazardKind::OrbitalBlackHole,
            center,
            c.black_hole_radius,
            Motion::Orbital {
                center,
                path: OrbitPath::Circle { radius: c.orbit_radius },
                angle,
                angular_speed: c.orbit_speed,
            },
            vec![
                Effect::Kill,
                Effect::Perturb(Perturbation::Pull {
                    range: c.pull_range,
                    strength: c.pull_strength,
                }),
            ],
        ));

        let angle = spawner.rng.random_range(0.0..TAU);
        hazards.push(spawner.spawn(
            HazardKind::Quasar,
            center,
            c.quasar_radius,
            Motion::Orbital {
                center,
                path: OrbitPath::Ellipse {
                    semi_major: c.quasar_semi_major,
                    semi_minor: c.quasar_semi_minor,
                },
                angle,
                angular_speed: c.quasar_speed,
            },
            vec![Effect::Perturb(Perturbation::Repel {
                range: c.repel_range,
                strength: c.repel_strength,
            })],
        ));

        for i in 0..c.dark_matter_count {
            let path = if i % 2 == 0 {
                OrbitPath::Spiral {
                    inner: c.orbit_radius * 0.3,
                    outer: c.orbit_radius,
                }
            } else {
                OrbitPath::FigureEight { size: c.orbit_radius }
            };
            let angle = TAU * i as f32 / c.dark_matter_count as f32;
            hazards.push(spawner.spawn(
                HazardKind::DarkMatter,
                center,
                c.dark_matter_radius,
                Motion::Orbital {
                    center,
                    path,
                    angle,
                    angular_speed: c.dark_matter_speed,
                },
                vec![Effect::Perturb(Perturbation::Damp {
                    range: c.dark_matter_radius,
                    factor: c.dark_matter_damping,
                })],
            ));
        }

        hazards
    }
}
