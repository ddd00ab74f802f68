//! Session struct definition
//!
//! Represents one connected client: its connection handle, the peer
//! address fixed at accept time, its display name and outbound queue.

use std::net::SocketAddr;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Server-side state for one connected client
#[derive(Debug, Clone)]
pub struct Session {
    /// Connection handle
    pub id: ClientId,
    /// Peer address (immutable, used as the block key)
    pub addr: SocketAddr,
    /// Display name (empty until registration succeeds)
    pub name: String,
    /// Server → Client frame queue, drained by the connection's writer task
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Create an unnamed session
    pub fn new(id: ClientId, addr: SocketAddr, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            addr,
            name: String::new(),
            sender,
        }
    }

    /// Queue a frame without waiting
    ///
    /// A full queue means the peer is not keeping up; the frame is dropped
    /// rather than stalling the caller.
    pub fn try_send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Check if this session has finished registration
    pub fn is_registered(&self) -> bool {
        !self.name.is_empty()
    }

    /// Get the display name, or the address for unregistered sessions
    pub fn display_name(&self) -> String {
        if self.is_registered() {
            self.name.clone()
        } else {
            self.addr.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_session_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let session = Session::new(ClientId::new(), addr(), tx);

        assert!(!session.is_registered());
        assert_eq!(session.display_name(), "127.0.0.1:40000");
    }

    #[tokio::test]
    async fn test_try_send_full_and_closed() {
        let (tx, mut rx) = mpsc::channel(1);
        let session = Session::new(ClientId::new(), addr(), tx);

        session.try_send(ServerMessage::server("one")).unwrap();
        assert!(matches!(
            session.try_send(ServerMessage::server("two")),
            Err(SendError::ChannelFull)
        ));
        assert_eq!(rx.recv().await, Some(ServerMessage::server("one")));

        drop(rx);
        assert!(matches!(
            session.try_send(ServerMessage::server("three")),
            Err(SendError::ChannelClosed)
        ));
    }
}
