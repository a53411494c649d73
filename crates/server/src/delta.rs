//! Per-tick state diffs sent to clients.

use crate::entity::{OrbId, PlayerId};
use crate::level::Tiers;
use crate::world::World;
use protocol::{GameStateDelta, HazardSnapshot, PlayerRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Remembers what clients were last told.
#[derive(Debug, Default)]
pub struct DeltaSynchronizer {
    players: HashMap<PlayerId, PlayerRecord>,
    orbs: BTreeSet<OrbId>,
}

impl DeltaSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the world against the previous call and remember the result.
    pub fn compute(
        &mut self,
        world: &World,
        tiers: &Tiers,
        hazards: HazardSnapshot,
    ) -> GameStateDelta {
        let mut delta = GameStateDelta {
            hazards,
            ..Default::default()
        };

        let mut current = HashMap::with_capacity(world.player_count());
        for player in world.players() {
            let record = player.record(tiers);
            let changed = match self.players.get(&player.id) {
                Some(prev) => record.differs_from(prev),
                None => true,
            };
            if changed {
                delta.players.insert(player.id, record.clone());
            }
            current.insert(player.id, record);
        }
        delta.removed_players = self
            .players
            .keys()
            .filter(|id| !current.contains_key(id))
            .copied()
            .collect();
        delta.removed_players.sort_unstable();
        self.players = current;

        let orbs: BTreeSet<OrbId> = world.orbs().map(|o| o.id).collect();
        delta.orbs = orbs
            .difference(&self.orbs)
            .filter_map(|id| world.orb(*id))
            .map(|o| o.record())
            .collect();
        delta.removed_orbs = self.orbs.difference(&orbs).copied().collect();
        self.orbs = orbs;

        delta
    }

    /// Everything currently in the world, for a client that just joined.
    /// Does not touch the remembered state.
    pub fn full_snapshot(world: &World, tiers: &Tiers, hazards: HazardSnapshot) -> GameStateDelta {
        GameStateDelta {
            players: world
                .players()
                .map(|p| (p.id, p.record(tiers)))
                .collect::<BTreeMap<_, _>>(),
            removed_players: Vec::new(),
            orbs: world.orbs().map(|o| o.record()).collect(),
            removed_orbs: Vec::new(),
            hazards,
        }
    }
}
