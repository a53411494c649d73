//! Game server implementation.
//!
//! Connection tasks never touch the game state. They forward decoded client
//! events to the game task through an inbox and write whatever the game
//! task queues for them.

use crate::config::Config;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod client;
pub mod game;

pub use client::{OUTBOUND_CAPACITY, Outbound, SessionId};
pub use game::{GameState, Inbound, PendingBroadcasts, run_game_loop, validate_name};

/// Cloneable handle to a running game task.
#[derive(Clone)]
pub struct GameHandle {
    inbox: UnboundedSender<Inbound>,
    next_session: Arc<AtomicU64>,
}

impl GameHandle {
    /// Register a new connection. Returns its session id and the stream of
    /// frames the game task wants written to it.
    pub fn connect(&self, addr: SocketAddr) -> (SessionId, Receiver<Outbound>) {
        let session = self.next_session.fetch_add(1, Ordering::Relaxed);
        let (outbound, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.submit(Inbound::Connect {
            session,
            addr,
            outbound,
        });
        (session, rx)
    }

    /// Decode a text frame and forward it. Malformed frames are dropped.
    pub fn submit_text(&self, session: SessionId, text: &str) {
        match protocol::decode(text) {
            Ok(event) => self.submit(Inbound::Event { session, event }),
            Err(e) => debug!("Dropping malformed frame from session {}: {}", session, e),
        }
    }

    pub fn disconnect(&self, session: SessionId) {
        self.submit(Inbound::Disconnect { session });
    }

    fn submit(&self, message: Inbound) {
        if self.inbox.send(message).is_err() {
            warn!("Game task is gone, dropping message");
        }
    }
}

/// Spawn the game task and return a handle to it.
pub fn start(config: &Config) -> GameHandle {
    let (inbox, rx) = mpsc::unbounded_channel();
    let game = GameState::new(config);
    tokio::spawn(run_game_loop(game, rx));
    GameHandle {
        inbox,
        next_session: Arc::new(AtomicU64::new(1)),
    }
}

/// Run the standalone WebSocket server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    let handle = start(&config);

    loop {
        let (stream, addr) = listener.accept().await?;
        let handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, handle).await {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handle: GameHandle,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();
    let (session, mut outbound) = handle.connect(addr);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle.submit_text(session, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    _ => {}
                }
            }
            out = outbound.recv() => {
                match out {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::text(text.to_string())).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    handle.disconnect(session);
    info!("Client {} disconnected", addr);
    Ok(())
}
