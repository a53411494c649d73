//! Server configuration.

use crate::level::{LevelBand, SizeBand, Tiers};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "NEBULA_CONFIG";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize default config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub orbs: OrbConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub bots: BotConfig,
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelBand>,
    #[serde(default)]
    pub hazards: HazardsConfig,
    #[serde(default)]
    pub special_event: SpecialEventConfig,
    #[serde(default)]
    pub quantum_tunnel: QuantumTunnelConfig,
}

impl Config {
    /// Load configuration from `$NEBULA_CONFIG` or `config.toml`, writing
    /// the defaults to disk when the file does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(io_err)?;
            toml::from_str(&contents)?
        } else {
            info!("No {:?} found, creating default config", path);
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?).map_err(io_err)?;
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return invalid("world dimensions must be positive");
        }
        if self.server.tick_interval_ms == 0 {
            return invalid("server.tick_interval_ms must be positive");
        }
        if self.player.min_size <= 0.0 {
            return invalid("player.min_size must be positive");
        }
        if self.player.start_size < self.player.min_size {
            return invalid("player.start_size must be at least player.min_size");
        }
        if self.player.base_radius <= 0.0 || self.player.reference_frame_ms <= 0.0 {
            return invalid("player.base_radius and player.reference_frame_ms must be positive");
        }
        if self.orbs.size <= 0.0 {
            return invalid("orbs.size must be positive");
        }
        if self.levels.is_empty() {
            return invalid("at least one level is required");
        }
        for level in &self.levels {
            if level.min >= level.max {
                return Err(ConfigError::Invalid(format!("level {:?} has min >= max", level.key)));
            }
        }
        for pair in self.levels.windows(2) {
            if pair[0].max != pair[1].min {
                return Err(ConfigError::Invalid(format!(
                    "levels {:?} and {:?} are not contiguous",
                    pair[0].key, pair[1].key
                )));
            }
        }

        let classic = self.hazards.classic.band;
        let orbital = self.hazards.orbital.band;
        if classic.min >= classic.max || orbital.min >= orbital.max {
            return invalid("hazard bands must have min < max");
        }
        if classic.overlaps(&orbital) {
            return invalid("hazards.classic.band and hazards.orbital.band must not overlap");
        }
        let c = &self.hazards.classic;
        if c.asteroid_speed_min > c.asteroid_speed_max
            || c.asteroid_radius_min > c.asteroid_radius_max
        {
            return invalid("asteroid min values must not exceed max values");
        }
        for chance in [self.bots.wander_chance, self.bots.orb_seek_chance] {
            if !(0.0..=1.0).contains(&chance) {
                return invalid("bot chances must lie in [0, 1]");
            }
        }
        Ok(())
    }

    /// Tier table derived from `levels` and the player sizing constants.
    pub fn tiers(&self) -> Tiers {
        Tiers::new(self.levels.clone(), self.player.base_radius, self.player.min_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            world: WorldConfig::default(),
            orbs: OrbConfig::default(),
            player: PlayerConfig::default(),
            bots: BotConfig::default(),
            levels: default_levels(),
            hazards: HazardsConfig::default(),
            special_event: SpecialEventConfig::default(),
            quantum_tunnel: QuantumTunnelConfig::default(),
        }
    }
}

fn default_levels() -> Vec<LevelBand> {
    [
        ("asteroid", 0.0, 40.0),
        ("planet", 40.0, 100.0),
        ("star", 100.0, 250.0),
        ("galaxy", 250.0, 600.0),
        ("supercumulo", 600.0, 1.0e9),
    ]
    .into_iter()
    .map(|(key, min, max)| LevelBand {
        key: key.to_string(),
        min,
        max,
    })
    .collect()
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Maximum simultaneous human players.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Directory served as static files by the unified binary.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Fixed RNG seed (random when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            tick_interval_ms: default_tick_interval(),
            max_players: default_max_players(),
            static_dir: default_static_dir(),
            seed: None,
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_tick_interval() -> u64 {
    50
}
fn default_max_players() -> usize {
    50
}
fn default_static_dir() -> String {
    "public".to_string()
}

/// World dimensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_size")]
    pub width: f32,
    #[serde(default = "default_world_size")]
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_size(),
            height: default_world_size(),
        }
    }
}

fn default_world_size() -> f32 {
    4000.0
}

/// Orb configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrbConfig {
    /// Number of orbs kept in the world at all times.
    #[serde(default = "default_orb_count")]
    pub count: usize,
    #[serde(default = "default_orb_size")]
    pub size: f32,
    /// Size a player gains per orb.
    #[serde(default = "default_orb_growth")]
    pub growth: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            count: default_orb_count(),
            size: default_orb_size(),
            growth: default_orb_growth(),
        }
    }
}

fn default_orb_count() -> usize {
    400
}
fn default_orb_size() -> f32 {
    5.0
}
fn default_orb_growth() -> f32 {
    1.0
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_start_size")]
    pub start_size: f32,
    /// Radius every player has on entering a tier.
    #[serde(default = "default_base_radius")]
    pub base_radius: f32,
    #[serde(default = "default_min_size")]
    pub min_size: f32,
    /// Speed (units per reference frame) at the base radius.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    #[serde(default = "default_reference_frame_ms")]
    pub reference_frame_ms: f32,
    #[serde(default = "default_eat_threshold")]
    pub eat_threshold: f32,
    /// Fraction of the eaten player's size the eater gains.
    #[serde(default = "default_eat_growth_fraction")]
    pub eat_growth_fraction: f32,
    /// Multiplier on the summed radii for player contact.
    #[serde(default = "default_contact_inflation")]
    pub contact_inflation: f32,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_size: default_start_size(),
            base_radius: default_base_radius(),
            min_size: default_min_size(),
            base_speed: default_base_speed(),
            reference_frame_ms: default_reference_frame_ms(),
            eat_threshold: default_eat_threshold(),
            eat_growth_fraction: default_eat_growth_fraction(),
            contact_inflation: default_contact_inflation(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_start_size() -> f32 {
    20.0
}
fn default_base_radius() -> f32 {
    20.0
}
fn default_min_size() -> f32 {
    5.0
}
fn default_base_speed() -> f32 {
    4.0
}
fn default_reference_frame_ms() -> f32 {
    1000.0 / 60.0
}
fn default_eat_threshold() -> f32 {
    1.1
}
fn default_eat_growth_fraction() -> f32 {
    0.5
}
fn default_contact_inflation() -> f32 {
    1.1
}
fn default_max_name_length() -> usize {
    20
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_count")]
    pub count: usize,
    #[serde(default = "default_bot_respawn_delay")]
    pub respawn_delay_ms: u64,
    #[serde(default = "default_bot_speed_multiplier")]
    pub speed_multiplier: f32,
    /// Per-tick probability of picking a new wander target.
    #[serde(default = "default_wander_chance")]
    pub wander_chance: f64,
    #[serde(default = "default_orb_seek_radius")]
    pub orb_seek_radius: f32,
    /// Per-tick probability of chasing the nearest orb.
    #[serde(default = "default_orb_seek_chance")]
    pub orb_seek_chance: f64,
    #[serde(default = "default_threat_radius")]
    pub threat_radius: f32,
    #[serde(default = "default_flee_distance")]
    pub flee_distance: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            count: default_bot_count(),
            respawn_delay_ms: default_bot_respawn_delay(),
            speed_multiplier: default_bot_speed_multiplier(),
            wander_chance: default_wander_chance(),
            orb_seek_radius: default_orb_seek_radius(),
            orb_seek_chance: default_orb_seek_chance(),
            threat_radius: default_threat_radius(),
            flee_distance: default_flee_distance(),
        }
    }
}

fn default_bot_count() -> usize {
    12
}
fn default_bot_respawn_delay() -> u64 {
    3000
}
fn default_bot_speed_multiplier() -> f32 {
    0.85
}
fn default_wander_chance() -> f64 {
    0.02
}
fn default_orb_seek_radius() -> f32 {
    300.0
}
fn default_orb_seek_chance() -> f64 {
    0.3
}
fn default_threat_radius() -> f32 {
    500.0
}
fn default_flee_distance() -> f32 {
    300.0
}

/// Both hazard sets.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HazardsConfig {
    #[serde(default)]
    pub classic: ClassicHazardConfig,
    #[serde(default)]
    pub orbital: OrbitalHazardConfig,
}

/// Black hole, white hole and asteroid shower.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassicHazardConfig {
    #[serde(default = "default_classic_band")]
    pub band: SizeBand,
    #[serde(default = "default_black_hole_radius")]
    pub black_hole_radius: f32,
    #[serde(default = "default_white_hole_radius")]
    pub white_hole_radius: f32,
    /// Minimum distance between the two holes.
    #[serde(default = "default_hole_separation")]
    pub min_hole_separation: f32,
    /// Holes are placed at least this far from the world edge.
    #[serde(default = "default_edge_margin")]
    pub edge_margin: f32,
    #[serde(default = "default_asteroid_interval")]
    pub asteroid_interval_ms: u64,
    #[serde(default = "default_asteroid_speed_min")]
    pub asteroid_speed_min: f32,
    #[serde(default = "default_asteroid_speed_max")]
    pub asteroid_speed_max: f32,
    #[serde(default = "default_asteroid_radius_min")]
    pub asteroid_radius_min: f32,
    #[serde(default = "default_asteroid_radius_max")]
    pub asteroid_radius_max: f32,
    /// Distance past the world edge before an asteroid is pruned.
    #[serde(default = "default_asteroid_padding")]
    pub asteroid_padding: f32,
}

impl Default for ClassicHazardConfig {
    fn default() -> Self {
        Self {
            band: default_classic_band(),
            black_hole_radius: default_black_hole_radius(),
            white_hole_radius: default_white_hole_radius(),
            min_hole_separation: default_hole_separation(),
            edge_margin: default_edge_margin(),
            asteroid_interval_ms: default_asteroid_interval(),
            asteroid_speed_min: default_asteroid_speed_min(),
            asteroid_speed_max: default_asteroid_speed_max(),
            asteroid_radius_min: default_asteroid_radius_min(),
            asteroid_radius_max: default_asteroid_radius_max(),
            asteroid_padding: default_asteroid_padding(),
        }
    }
}

fn default_classic_band() -> SizeBand {
    SizeBand::new(100.0, 250.0)
}
fn default_black_hole_radius() -> f32 {
    60.0
}
fn default_white_hole_radius() -> f32 {
    50.0
}
fn default_hole_separation() -> f32 {
    800.0
}
fn default_edge_margin() -> f32 {
    200.0
}
fn default_asteroid_interval() -> u64 {
    4000
}
fn default_asteroid_speed_min() -> f32 {
    2.0
}
fn default_asteroid_speed_max() -> f32 {
    5.0
}
fn default_asteroid_radius_min() -> f32 {
    15.0
}
fn default_asteroid_radius_max() -> f32 {
    40.0
}
fn default_asteroid_padding() -> f32 {
    100.0
}

/// Orbiting black hole, quasar and dark-matter clouds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrbitalHazardConfig {
    #[serde(default = "default_orbital_band")]
    pub band: SizeBand,
    /// Kill radius of the orbiting black hole.
    #[serde(default = "default_orbital_black_hole_radius")]
    pub black_hole_radius: f32,
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f32,
    /// Radians per reference frame.
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,
    #[serde(default = "default_pull_range")]
    pub pull_range: f32,
    /// Drift (units per reference frame) at the black hole's edge.
    #[serde(default = "default_pull_strength")]
    pub pull_strength: f32,
    #[serde(default = "default_quasar_radius")]
    pub quasar_radius: f32,
    #[serde(default = "default_quasar_semi_major")]
    pub quasar_semi_major: f32,
    #[serde(default = "default_quasar_semi_minor")]
    pub quasar_semi_minor: f32,
    #[serde(default = "default_quasar_speed")]
    pub quasar_speed: f32,
    #[serde(default = "default_repel_range")]
    pub repel_range: f32,
    #[serde(default = "default_repel_strength")]
    pub repel_strength: f32,
    #[serde(default = "default_dark_matter_count")]
    pub dark_matter_count: usize,
    #[serde(default = "default_dark_matter_radius")]
    pub dark_matter_radius: f32,
    /// Speed factor applied inside a cloud.
    #[serde(default = "default_dark_matter_damping")]
    pub dark_matter_damping: f32,
    #[serde(default = "default_dark_matter_speed")]
    pub dark_matter_speed: f32,
}

impl Default for OrbitalHazardConfig {
    fn default() -> Self {
        Self {
            band: default_orbital_band(),
            black_hole_radius: default_orbital_black_hole_radius(),
            orbit_radius: default_orbit_radius(),
            orbit_speed: default_orbit_speed(),
            pull_range: default_pull_range(),
            pull_strength: default_pull_strength(),
            quasar_radius: default_quasar_radius(),
            quasar_semi_major: default_quasar_semi_major(),
            quasar_semi_minor: default_quasar_semi_minor(),
            quasar_speed: default_quasar_speed(),
            repel_range: default_repel_range(),
            repel_strength: default_repel_strength(),
            dark_matter_count: default_dark_matter_count(),
            dark_matter_radius: default_dark_matter_radius(),
            dark_matter_damping: default_dark_matter_damping(),
            dark_matter_speed: default_dark_matter_speed(),
        }
    }
}

fn default_orbital_band() -> SizeBand {
    SizeBand::new(250.0, 600.0)
}
fn default_orbital_black_hole_radius() -> f32 {
    70.0
}
fn default_orbit_radius() -> f32 {
    900.0
}
fn default_orbit_speed() -> f32 {
    0.004
}
fn default_pull_range() -> f32 {
    600.0
}
fn default_pull_strength() -> f32 {
    3.0
}
fn default_quasar_radius() -> f32 {
    50.0
}
fn default_quasar_semi_major() -> f32 {
    1200.0
}
fn default_quasar_semi_minor() -> f32 {
    700.0
}
fn default_quasar_speed() -> f32 {
    0.003
}
fn default_repel_range() -> f32 {
    400.0
}
fn default_repel_strength() -> f32 {
    4.0
}
fn default_dark_matter_count() -> usize {
    3
}
fn default_dark_matter_radius() -> f32 {
    250.0
}
fn default_dark_matter_damping() -> f32 {
    0.5
}
fn default_dark_matter_speed() -> f32 {
    0.002
}

/// Gravitational pull event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecialEventConfig {
    /// Size a player needs before it may trigger the event.
    #[serde(default = "default_event_threshold")]
    pub size_threshold: f32,
    #[serde(default = "default_event_duration")]
    pub duration_ms: u64,
    /// Units per reference frame.
    #[serde(default = "default_pull_speed")]
    pub pull_speed: f32,
    #[serde(default = "default_stop_radius")]
    pub stop_radius: f32,
    #[serde(default = "default_regrow_rate")]
    pub regrow_per_second: f32,
    /// Total size a frozen player may regrow.
    #[serde(default = "default_max_regrowth")]
    pub max_regrowth: f32,
    /// Distance of each helper bot from the rally point.
    #[serde(default = "default_helper_offset")]
    pub helper_offset: f32,
    #[serde(default = "default_helper_size")]
    pub helper_size: f32,
}

impl Default for SpecialEventConfig {
    fn default() -> Self {
        Self {
            size_threshold: default_event_threshold(),
            duration_ms: default_event_duration(),
            pull_speed: default_pull_speed(),
            stop_radius: default_stop_radius(),
            regrow_per_second: default_regrow_rate(),
            max_regrowth: default_max_regrowth(),
            helper_offset: default_helper_offset(),
            helper_size: default_helper_size(),
        }
    }
}

fn default_event_threshold() -> f32 {
    600.0
}
fn default_event_duration() -> u64 {
    10_000
}
fn default_pull_speed() -> f32 {
    6.0
}
fn default_stop_radius() -> f32 {
    150.0
}
fn default_regrow_rate() -> f32 {
    2.0
}
fn default_max_regrowth() -> f32 {
    50.0
}
fn default_helper_offset() -> f32 {
    250.0
}
fn default_helper_size() -> f32 {
    60.0
}

/// Teleport request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuantumTunnelConfig {
    #[serde(default = "default_tunnel_band")]
    pub band: SizeBand,
    /// Minimum spacing between two teleports of the same player.
    #[serde(default = "default_tunnel_cooldown")]
    pub cooldown_ms: u64,
}

impl Default for QuantumTunnelConfig {
    fn default() -> Self {
        Self {
            band: default_tunnel_band(),
            cooldown_ms: default_tunnel_cooldown(),
        }
    }
}

fn default_tunnel_band() -> SizeBand {
    SizeBand::new(250.0, 1.0e9)
}
fn default_tunnel_cooldown() -> u64 {
    5000
}
