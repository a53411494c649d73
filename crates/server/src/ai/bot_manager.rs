use super::bot_player::Bot;
use crate::config::Config;
use crate::entity::{NewPlayer, PlayerId, PlayerKind, PlayerState};
use crate::level::Tiers;
use crate::world::World;
use rand::rngs::StdRng;
use tracing::debug;

/// Bot manager.
#[derive(Debug, Default)]
pub struct BotManager {
    /// Active bots.
    pub bots: Vec<Bot>,
}

impl BotManager {
    /// Create a new bot manager.
    pub fn new() -> Self {
        Self { bots: Vec::new() }
    }

    /// Spawn one AI bot into the world and start driving it.
    pub fn add_bot(
        &mut self,
        world: &mut World,
        tiers: &Tiers,
        config: &Config,
        rng: &mut StdRng,
        now_ms: u64,
    ) -> PlayerId {
        let spec = NewPlayer {
            kind: PlayerKind::Bot,
            name: Bot::random_name(rng),
            position: world.border.random_position(rng),
            size: config.player.start_size,
            state: PlayerState::Normal,
        };
        let id = world.spawn_player(spec, tiers, now_ms);
        self.bots.push(Bot::new(id));
        id
    }

    /// Top the population up to `bots.count`.
    pub fn spawn_bots(
        &mut self,
        world: &mut World,
        tiers: &Tiers,
        config: &Config,
        rng: &mut StdRng,
        now_ms: u64,
    ) {
        while self.bots.len() < config.bots.count {
            let id = self.add_bot(world, tiers, config, rng, now_ms);
            debug!("Spawned bot {}", id);
        }
    }

    /// Update all bots.
    pub fn update(&mut self, world: &mut World, config: &Config, rng: &mut StdRng) {
        for bot in &self.bots {
            bot.update(world, config, rng);
        }
    }

    /// Record a bot death. Returns false for ids this manager doesn't drive.
    pub fn schedule_respawn(&mut self, id: PlayerId, config: &Config, now_ms: u64) -> bool {
        match self.bots.iter_mut().find(|b| b.id == id) {
            Some(bot) => {
                bot.respawn_at = Some(now_ms + config.bots.respawn_delay_ms);
                true
            }
            None => false,
        }
    }

    /// Bring back every bot whose delay has elapsed. Returns their ids.
    pub fn process_respawns(
        &mut self,
        world: &mut World,
        tiers: &Tiers,
        config: &Config,
        rng: &mut StdRng,
        now_ms: u64,
    ) -> Vec<PlayerId> {
        let mut respawned = Vec::new();
        for bot in &mut self.bots {
            match bot.respawn_at {
                Some(at) if at <= now_ms => {}
                _ => continue,
            }
            let position = world.border.random_position(rng);
            if let Some(player) = world.player_mut(bot.id) {
                player.respawn(position, config.player.start_size, tiers, now_ms);
                bot.respawn_at = None;
                respawned.push(bot.id);
            }
        }
        respawned
    }
}
