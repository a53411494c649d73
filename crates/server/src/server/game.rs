//! Game state and main loop.

use crate::ai::BotManager;
use crate::collision::{self, Kill};
use crate::config::Config;
use crate::delta::DeltaSynchronizer;
use crate::entity::{NewPlayer, Player, PlayerId, PlayerKind, PlayerState};
use crate::error::GameError;
use crate::hazards::{HazardOutcome, HazardSubsystem};
use crate::level::Tiers;
use crate::movement;
use crate::scheduler::TickScheduler;
use crate::special_event::SpecialEvent;
use crate::world::World;
use protocol::{
    ClientEvent, GameOver, GravitationalPull, HazardKind, InitData, NameError, Notice, Point,
    ServerEvent, WhiteHoleUsed,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tracing::{debug, error, info, warn};

use super::client::{Client, Outbound, SessionId};

/// Message from a connection task to the game task.
#[derive(Debug)]
pub enum Inbound {
    Connect {
        session: SessionId,
        addr: SocketAddr,
        outbound: Sender<Outbound>,
    },
    Event {
        session: SessionId,
        event: ClientEvent,
    },
    Disconnect {
        session: SessionId,
    },
}

/// Events produced by a tick, sent once the tick has finished.
#[derive(Debug, Default)]
pub struct PendingBroadcasts {
    /// Sent to every initialized session.
    pub broadcast: Vec<ServerEvent>,
    /// Sent to one session, in order.
    pub targeted: Vec<(SessionId, ServerEvent)>,
    /// Sessions to close after their events.
    pub close: Vec<SessionId>,
}

/// Main game state. Owned by the game task; never shared.
pub struct GameState {
    pub config: Config,
    tiers: Tiers,
    pub tick_count: u64,
    /// Simulation clock, advanced by each tick's step.
    clock_ms: u64,

    // Connected clients
    clients: HashMap<SessionId, Client>,
    inbox: VecDeque<Inbound>,

    // Game world (players and orbs)
    pub world: World,

    // Bot manager
    pub bots: BotManager,

    hazards: HazardSubsystem,
    event: SpecialEvent,
    delta: DeltaSynchronizer,
    rng: StdRng,

    pending: PendingBroadcasts,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    /// Create a new game state with orbs and bots already spawned.
    pub fn new(config: &Config) -> Self {
        let rng = match config.server.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut game = Self {
            config: config.clone(),
            tiers: config.tiers(),
            tick_count: 0,
            clock_ms: 0,
            clients: HashMap::new(),
            inbox: VecDeque::new(),
            world: World::new(config.world.width, config.world.height),
            bots: BotManager::new(),
            hazards: HazardSubsystem::new(&config.hazards),
            event: SpecialEvent::new(),
            delta: DeltaSynchronizer::new(),
            rng,
            pending: PendingBroadcasts::default(),
            update_time_avg: 0.0,
        };

        game.world
            .fill_orbs(game.config.orbs.count, game.config.orbs.size, &mut game.rng);
        game.bots
            .spawn_bots(&mut game.world, &game.tiers, &game.config, &mut game.rng, 0);
        info!(
            "World initialized: {} orbs, {} bots",
            game.world.orb_count(),
            game.bots.bots.len()
        );
        game
    }

    #[inline]
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    #[inline]
    pub fn tiers(&self) -> &Tiers {
        &self.tiers
    }

    pub fn client(&self, session: SessionId) -> Option<&Client> {
        self.clients.get(&session)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn special_event(&self) -> &SpecialEvent {
        &self.event
    }

    /// Queue a message for the next tick.
    pub fn enqueue(&mut self, message: Inbound) {
        self.inbox.push_back(message);
    }

    /// Run one simulation step of `dt`.
    pub fn tick(&mut self, dt: Duration) -> Result<PendingBroadcasts, GameError> {
        let dt_ms = dt.as_secs_f32() * 1000.0;
        self.tick_count += 1;
        self.clock_ms += dt.as_millis() as u64;
        let now = self.clock_ms;

        // Humans that died last tick have been shown dead exactly once.
        for id in self.world.flush_pending_removals() {
            debug!("Removed dead player {}", id);
        }

        while let Some(message) = self.inbox.pop_front() {
            self.handle_inbound(message);
        }

        // Movement, collisions, bots, then hazards and the event.
        let event_active = self.event.is_active();
        if !event_active {
            movement::update_player_movement(&mut self.world, &self.tiers, &self.config, dt_ms);
        }

        collision::resolve_orb_collisions(
            &mut self.world,
            &self.tiers,
            &self.config,
            &mut self.rng,
        );

        if !event_active {
            let kills =
                collision::resolve_player_collisions(&mut self.world, &self.tiers, &self.config);
            for Kill { eater, victim } in kills {
                let killer = self
                    .world
                    .player(eater)
                    .map(|p| p.name.clone())
                    .ok_or(GameError::MissingPlayer(eater))?;
                self.handle_death(victim, killer)?;
            }
        }

        for id in self
            .bots
            .process_respawns(&mut self.world, &self.tiers, &self.config, &mut self.rng, now)
        {
            debug!("Bot {} respawned", id);
        }
        self.bots.update(&mut self.world, &self.config, &mut self.rng);

        // Drift set here is applied by the next tick's movement.
        let outcomes = self
            .hazards
            .update(&mut self.world, &self.tiers, &mut self.rng, now, dt_ms);
        for outcome in outcomes {
            self.apply_hazard_outcome(outcome)?;
        }

        self.event
            .update(&mut self.world, &self.tiers, &self.config, now, dt_ms);

        self.check_invariants()?;

        let delta = self
            .delta
            .compute(&self.world, &self.tiers, self.hazards.snapshot());
        if !delta.is_empty() {
            self.pending.broadcast.push(ServerEvent::GameState(delta));
        }

        Ok(std::mem::take(&mut self.pending))
    }

    /// Encode and deliver a tick's events. Sessions whose connection task
    /// is gone or has a full queue are dropped.
    pub fn dispatch(&mut self, pending: PendingBroadcasts) {
        let mut dropped = Vec::new();

        for (session, event) in &pending.targeted {
            let (Some(client), Some(text)) = (self.clients.get(session), encode(event)) else {
                continue;
            };
            if !client.send(Outbound::Text(text)) {
                dropped.push(*session);
            }
        }

        for event in &pending.broadcast {
            let Some(text) = encode(event) else {
                continue;
            };
            for client in self.clients.values().filter(|c| c.initialized) {
                if !client.send(Outbound::Text(text.clone())) {
                    dropped.push(client.id);
                }
            }
        }

        for session in &pending.close {
            let Some(client) = self.clients.get(session) else {
                continue;
            };
            if !client.send(Outbound::Close) {
                dropped.push(*session);
            }
        }

        dropped.sort_unstable();
        dropped.dedup();
        for session in dropped {
            warn!("Session {} stopped receiving, dropping it", session);
            self.remove_client(session);
        }
    }

    fn handle_inbound(&mut self, message: Inbound) {
        match message {
            Inbound::Connect {
                session,
                addr,
                outbound,
            } => self.add_client(session, addr, outbound),
            Inbound::Event { session, event } => self.handle_event(session, event),
            Inbound::Disconnect { session } => self.remove_client(session),
        }
    }

    /// Register a new session, or turn it away when the game is full.
    fn add_client(&mut self, session: SessionId, addr: SocketAddr, outbound: Sender<Outbound>) {
        if self.world.human_count() >= self.config.server.max_players {
            warn!("Connection {} from {} rejected: game full", session, addr);
            if let Some(text) = encode(&game_full()) {
                let _ = outbound.try_send(Outbound::Text(text));
            }
            let _ = outbound.try_send(Outbound::Close);
            return;
        }
        self.clients.insert(session, Client::new(session, addr, outbound));
        info!("Client {} connected from {}", session, addr);
    }

    /// Remove a session and the player it controls.
    fn remove_client(&mut self, session: SessionId) {
        if let Some(client) = self.clients.remove(&session) {
            info!("Client {} ({}) disconnected", session, client.addr);
            if let Some(player) = client.player {
                self.world.remove_player(player);
            }
        }
    }

    fn handle_event(&mut self, session: SessionId, event: ClientEvent) {
        if !self.clients.contains_key(&session) {
            debug!("Event from unknown session {}", session);
            return;
        }
        match event {
            ClientEvent::SetName(name) => self.handle_set_name(session, &name),
            ClientEvent::Move(point) => self.handle_move(session, point),
            ClientEvent::QuantumTunnel(request) => self.handle_tunnel(session, request.to),
            ClientEvent::ReachedSupercumulo => self.handle_supercumulo(session),
        }
    }

    fn handle_set_name(&mut self, session: SessionId, raw: &str) {
        let current = self.clients.get(&session).and_then(|c| c.player);
        if current.is_some_and(|id| self.world.player(id).is_some_and(|p| p.alive)) {
            self.reply(session, name_error("You are already playing"));
            return;
        }

        let name = match validate_name(raw, self.config.player.max_name_length) {
            Ok(name) => name,
            Err(reason) => {
                debug!("Client {} sent invalid name {:?}: {}", session, raw, reason);
                self.reply(session, name_error(reason));
                return;
            }
        };

        if self.world.human_count() >= self.config.server.max_players {
            warn!("Client {} could not join: game full", session);
            self.reply(session, game_full());
            self.pending.close.push(session);
            return;
        }

        let spec = NewPlayer {
            kind: PlayerKind::Human,
            name,
            position: self.world.border.random_position(&mut self.rng),
            size: self.config.player.start_size,
            state: PlayerState::Normal,
        };
        let id = self.world.spawn_player(spec, &self.tiers, self.clock_ms);
        if let Some(client) = self.clients.get_mut(&session) {
            client.player = Some(id);
            client.initialized = true;
            client.last_tunnel_ms = None;
        }
        info!("Client {} joined as player {}", session, id);

        self.reply(
            session,
            ServerEvent::Init(InitData {
                player_id: id,
                world_width: self.world.border.width,
                world_height: self.world.border.height,
            }),
        );
        let snapshot =
            DeltaSynchronizer::full_snapshot(&self.world, &self.tiers, self.hazards.snapshot());
        self.reply(session, ServerEvent::GameState(snapshot));
    }

    fn handle_move(&mut self, session: SessionId, point: Point) {
        if !point.is_finite() {
            debug!("Client {} sent non-finite move target", session);
            return;
        }
        let target = self.world.border.clamp(point.into());
        match self.controlled_player(session) {
            Some(player) if player.accepts_input() => player.target = Some(target),
            _ => debug!("Move from client {} ignored", session),
        }
    }

    fn handle_tunnel(&mut self, session: SessionId, to: Point) {
        if !to.is_finite() {
            debug!("Client {} sent non-finite tunnel target", session);
            return;
        }
        let now = self.clock_ms;
        let cooldown = self.config.quantum_tunnel.cooldown_ms;
        let ready = self
            .clients
            .get(&session)
            .is_some_and(|c| c.tunnel_ready(now, cooldown));
        if !ready {
            debug!("Tunnel from client {} rate limited", session);
            return;
        }

        let band = self.config.quantum_tunnel.band;
        let destination = self.world.border.clamp(to.into());
        match self.controlled_player(session) {
            Some(player) if player.accepts_input() && band.contains(player.size()) => {
                player.position = destination;
                player.target = None;
            }
            _ => {
                debug!("Tunnel from client {} rejected", session);
                return;
            }
        }
        if let Some(client) = self.clients.get_mut(&session) {
            client.last_tunnel_ms = Some(now);
        }
    }

    fn handle_supercumulo(&mut self, session: SessionId) {
        let Some(requester) = self.clients.get(&session).and_then(|c| c.player) else {
            return;
        };
        match self
            .event
            .try_start(requester, &mut self.world, &self.tiers, &self.config, self.clock_ms)
        {
            Ok(center) => {
                let pull = GravitationalPull {
                    center: center.into(),
                    duration: self.config.special_event.duration_ms,
                    message: "A supercluster has formed! Gravity pulls everything in.".to_string(),
                };
                self.pending
                    .broadcast
                    .push(ServerEvent::GravitationalPull(pull));
            }
            Err(e) => debug!("Client {}: {}", session, e),
        }
    }

    fn apply_hazard_outcome(&mut self, outcome: HazardOutcome) -> Result<(), GameError> {
        match outcome {
            HazardOutcome::Killed { player, cause } => {
                self.handle_death(player, hazard_name(cause).to_string())
            }
            HazardOutcome::Teleported { player, to } => {
                if let Some(session) = self.session_of(player) {
                    let used = WhiteHoleUsed { to: to.into() };
                    self.reply(session, ServerEvent::WhiteHoleUsed(used));
                }
                Ok(())
            }
            HazardOutcome::Struck { player } => {
                debug!("Player {} struck by an asteroid", player);
                Ok(())
            }
        }
    }

    /// A player died: bots are scheduled to respawn, helpers vanish and
    /// humans get `gameOver` before being removed next tick.
    fn handle_death(&mut self, victim: PlayerId, killed_by: String) -> Result<(), GameError> {
        let player = self.world.player(victim).ok_or(GameError::MissingPlayer(victim))?;

        if self.bots.schedule_respawn(victim, &self.config, self.clock_ms) {
            debug!("Bot {} killed by {}", victim, killed_by);
            return Ok(());
        }
        if player.is_bot() {
            self.world.remove_player(victim);
            return Ok(());
        }

        let final_size = player.size();
        let survival_time = self.clock_ms.saturating_sub(player.joined_at_ms) / 1000;
        info!(
            "Player {} ({}) killed by {} after {}s",
            victim, player.name, killed_by, survival_time
        );
        if let Some(session) = self.session_of(victim) {
            self.reply(
                session,
                ServerEvent::GameOver(GameOver {
                    message: format!("You were consumed by {}", killed_by),
                    killed_by,
                    final_size,
                    survival_time,
                }),
            );
        }
        self.world.mark_pending_removal(victim);
        Ok(())
    }

    fn check_invariants(&self) -> Result<(), GameError> {
        let expected = self.config.orbs.count;
        if self.world.orb_count() != expected {
            return Err(GameError::OrbCountDrift {
                expected,
                actual: self.world.orb_count(),
            });
        }
        for player in self.world.players() {
            if player.size() <= 0.0 {
                return Err(GameError::NonPositiveSize {
                    id: player.id,
                    size: player.size(),
                });
            }
            if player.alive && self.world.is_pending_removal(player.id) {
                return Err(GameError::AliveAndPendingRemoval(player.id));
            }
        }
        Ok(())
    }

    fn controlled_player(&mut self, session: SessionId) -> Option<&mut Player> {
        let id = self.clients.get(&session)?.player?;
        self.world.player_mut(id)
    }

    fn session_of(&self, player: PlayerId) -> Option<SessionId> {
        self.clients
            .values()
            .find(|c| c.player == Some(player))
            .map(|c| c.id)
    }

    fn reply(&mut self, session: SessionId, event: ServerEvent) {
        self.pending.targeted.push((session, event));
    }
}

/// Trim and check a display name. Allowed: ASCII letters, digits,
/// underscore and space.
pub fn validate_name(raw: &str, max_len: usize) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Name cannot be empty");
    }
    if name.chars().count() > max_len {
        return Err("Name is too long");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
    {
        return Err("Name may only contain letters, digits, spaces and underscores");
    }
    Ok(name.to_string())
}

fn hazard_name(kind: HazardKind) -> &'static str {
    match kind {
        HazardKind::BlackHole => "a Black Hole",
        HazardKind::WhiteHole => "a White Hole",
        HazardKind::Asteroid => "an Asteroid",
        HazardKind::OrbitalBlackHole => "an Orbital Black Hole",
        HazardKind::Quasar => "a Quasar",
        HazardKind::DarkMatter => "Dark Matter",
    }
}

fn name_error(reason: &str) -> ServerEvent {
    ServerEvent::NameError(NameError {
        error: reason.to_string(),
    })
}

fn game_full() -> ServerEvent {
    ServerEvent::GameFull(Notice {
        message: "The game is full, try again later".to_string(),
    })
}

fn encode(event: &ServerEvent) -> Option<Arc<str>> {
    match protocol::encode(event) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            error!("Failed to encode {:?}: {}", event, e);
            None
        }
    }
}

/// Run the main game loop until every inbox sender is gone.
pub async fn run_game_loop(mut game: GameState, mut inbox: UnboundedReceiver<Inbound>) {
    let interval = Duration::from_millis(game.config.server.tick_interval_ms);
    let mut scheduler = TickScheduler::new(interval);
    let tick_budget = game.config.server.tick_interval_ms as f64 * 0.9;

    loop {
        let started = Instant::now();
        let dt = scheduler.begin_tick(started);

        loop {
            match inbox.try_recv() {
                Ok(message) => game.enqueue(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Inbox closed, stopping game loop");
                    return;
                }
            }
        }

        match panic::catch_unwind(AssertUnwindSafe(|| game.tick(dt))) {
            Ok(Ok(pending)) => game.dispatch(pending),
            Ok(Err(e)) => error!("Tick #{} failed: {}", game.tick_count, e),
            Err(_) => error!("Tick #{} panicked, continuing", game.tick_count),
        }

        let tick_ms = started.elapsed().as_secs_f64() * 1000.0;
        // Exponential moving average
        game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;
        if tick_ms > tick_budget {
            warn!(
                "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} clients, {} players",
                game.tick_count,
                tick_ms,
                tick_budget,
                game.client_count(),
                game.world.player_count()
            );
        }

        tokio::time::sleep(scheduler.delay_after(started, Instant::now())).await;
    }
}
