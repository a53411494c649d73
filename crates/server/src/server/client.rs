//! Client session state.

use crate::entity::PlayerId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Unique id of one WebSocket connection.
pub type SessionId = u64;

/// Frames a connection task may fall behind by before it is dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

/// What the game task asks a connection task to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// An encoded JSON frame. Broadcasts share one allocation.
    Text(Arc<str>),
    /// Close the socket.
    Close,
}

/// A connected client session.
#[derive(Debug)]
pub struct Client {
    /// Unique session ID.
    pub id: SessionId,
    /// Remote address.
    pub addr: SocketAddr,
    /// Player currently controlled by this session, if any.
    pub player: Option<PlayerId>,
    /// Whether `init` has been sent (the session then receives broadcasts).
    pub initialized: bool,
    /// Simulation time of the last accepted teleport.
    pub last_tunnel_ms: Option<u64>,
    outbound: Sender<Outbound>,
}

impl Client {
    /// Create a new client session.
    pub fn new(id: SessionId, addr: SocketAddr, outbound: Sender<Outbound>) -> Self {
        Self {
            id,
            addr,
            player: None,
            initialized: false,
            last_tunnel_ms: None,
            outbound,
        }
    }

    /// Queue a frame for the connection task. Returns false once the
    /// connection task has gone away or stopped draining its queue.
    pub fn send(&self, message: Outbound) -> bool {
        match self.outbound.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue for session {} ({}) is full", self.id, self.addr);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Whether a teleport at `now_ms` respects the cooldown.
    pub fn tunnel_ready(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        match self.last_tunnel_ms {
            Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::channel;

    #[test]
    fn test_send_fails_after_receiver_dropped() {
        let (tx, rx) = channel(OUTBOUND_CAPACITY);
        let client = Client::new(1, "127.0.0.1:9000".parse().unwrap(), tx);
        assert!(client.send(Outbound::Close));
        drop(rx);
        assert!(!client.send(Outbound::Close));
    }

    #[test]
    fn test_send_fails_when_queue_full() {
        let (tx, mut rx) = channel(2);
        let client = Client::new(1, "127.0.0.1:9000".parse().unwrap(), tx);
        assert!(client.send(Outbound::Close));
        assert!(client.send(Outbound::Close));
        assert!(!client.send(Outbound::Close));

        assert_eq!(rx.try_recv(), Ok(Outbound::Close));
        assert!(client.send(Outbound::Close));
    }

    #[test]
    fn test_tunnel_cooldown() {
        let (tx, _rx) = channel(OUTBOUND_CAPACITY);
        let mut client = Client::new(1, "127.0.0.1:9000".parse().unwrap(), tx);
        assert!(client.tunnel_ready(0, 5000));
        client.last_tunnel_ms = Some(1000);
        assert!(!client.tunnel_ready(5999, 5000));
        assert!(client.tunnel_ready(6000, 5000));
    }
}
