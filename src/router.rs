//! Message router
//!
//! Interprets frames from active sessions and dispatches them to one or
//! all sessions, honoring block relationships. The router owns the
//! registry, username directory and block lists; it is driven only by the
//! `ChatServer` actor, which makes every call atomic with respect to the
//! others.
//!
//! Relayed chat is queued with `try_send`: a recipient whose queue is full
//! or closed is skipped and delivery continues with the rest. The
//! originator's acknowledgment is returned in the `Outcome` instead.

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::blocklist::BlockListManager;
use crate::codec::MAX_PAYLOAD;
use crate::directory::UsernameDirectory;
use crate::error::{NameError, RouteError};
use crate::message::{Command, ServerMessage};
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::types::ClientId;

/// Result of dispatching one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Acknowledgment or error for the originating connection
    pub reply: ServerMessage,
    /// End the session after sending `reply`
    pub disconnect: bool,
}

impl Outcome {
    fn reply(reply: impl Into<ServerMessage>) -> Self {
        Self {
            reply: reply.into(),
            disconnect: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Router {
    registry: SessionRegistry,
    directory: UsernameDirectory,
    blocks: BlockListManager,
}

impl Router {
    pub fn new(directory: UsernameDirectory) -> Self {
        Self {
            registry: SessionRegistry::new(),
            directory,
            blocks: BlockListManager::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn blocks(&self) -> &BlockListManager {
        &self.blocks
    }

    /// Create an unnamed session with an empty block set
    pub fn connect(
        &mut self,
        id: ClientId,
        addr: SocketAddr,
        sender: mpsc::Sender<ServerMessage>,
    ) -> bool {
        if !self.registry.register(id, addr, sender) {
            warn!("Client {} is already registered", id);
            return false;
        }
        self.blocks.insert(id);
        true
    }

    /// Tear down a session and its block set
    pub fn disconnect(&mut self, id: ClientId) -> Option<Session> {
        self.blocks.remove(id);
        self.registry.remove(id)
    }

    pub fn set_name(&mut self, id: ClientId, name: &str) -> Result<(), NameError> {
        let result = self.directory.try_set_name(&mut self.registry, id, name);
        match &result {
            Ok(()) => info!("Client {} set username to '{}'", id, name),
            Err(e) => debug!("Client {} rejected username '{}': {}", id, name, e),
        }
        result
    }

    /// Interpret one frame from an active session
    pub fn dispatch(&mut self, id: ClientId, frame: &str) -> Outcome {
        if self.registry.get(id).is_none() {
            warn!("Frame from unknown client {}", id);
            return Outcome {
                reply: ServerMessage::server("Session not found."),
                disconnect: true,
            };
        }

        match Command::parse(frame) {
            Command::Username { name } => match self.set_name(id, &name) {
                Ok(()) => Outcome::reply(ServerMessage::server("Username updated.")),
                Err(e) => Outcome::reply(e),
            },
            Command::DirectMessage { recipient, text } => {
                match self.direct_message(id, &recipient, text) {
                    Ok(()) => Outcome::reply(ServerMessage::server("DM sent successfully.")),
                    Err(e) => Outcome::reply((e, recipient.as_str())),
                }
            }
            Command::Block { name } => {
                match self.blocks.block(&self.registry, id, &name) {
                    Ok(()) => {
                        info!("Client {} blocked '{}'", id, name);
                        Outcome::reply(ServerMessage::server(format!(
                            "Client {} has been blocked.",
                            name
                        )))
                    }
                    Err(e) => Outcome::reply((e, name.as_str())),
                }
            }
            Command::Unblock { name } => {
                match self.blocks.unblock(&self.registry, id, &name) {
                    Ok(()) => {
                        info!("Client {} unblocked '{}'", id, name);
                        Outcome::reply(ServerMessage::server(format!(
                            "Client {} has been unblocked.",
                            name
                        )))
                    }
                    Err(e) => Outcome::reply((e, name.as_str())),
                }
            }
            Command::Disconnect => Outcome {
                reply: ServerMessage::server("Disconnected."),
                disconnect: true,
            },
            Command::Chat { text } => match self.broadcast(id, text) {
                Ok(delivered) => {
                    debug!("Broadcast from {} delivered to {} sessions", id, delivered);
                    Outcome::reply(ServerMessage::server("Message received"))
                }
                Err(e) => Outcome::reply((e, "")),
            },
            Command::Malformed { usage } => Outcome::reply((RouteError::Usage(usage), "")),
        }
    }

    /// Deliver chat to every registered session not mutually blocked with
    /// the sender. Returns the number of sessions the frame was queued for.
    fn broadcast(&self, id: ClientId, text: String) -> Result<usize, RouteError> {
        let sender = self.registry.get(id).ok_or(RouteError::UnknownRecipient)?;
        let msg = ServerMessage::Chat {
            from: sender.name.clone(),
            text,
        };
        if msg.to_string().len() > MAX_PAYLOAD {
            return Err(RouteError::MessageTooLong);
        }

        let snapshot = self.registry.all();
        let mut delivered = 0;
        for target in &snapshot {
            if target.id == id || !target.is_registered() {
                continue;
            }
            if self.blocks.is_blocked(id, target.addr)
                || self.blocks.is_blocked(target.id, sender.addr)
            {
                continue;
            }
            match target.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Dropped broadcast to {}: {}", target.display_name(), e),
            }
        }
        Ok(delivered)
    }

    /// Resolve name, then address, then check both block sets
    fn direct_message(
        &self,
        id: ClientId,
        recipient: &str,
        text: String,
    ) -> Result<(), RouteError> {
        let sender = self.registry.get(id).ok_or(RouteError::UnknownRecipient)?;
        if recipient == sender.name {
            return Err(RouteError::SelfDM);
        }

        let target = self
            .registry
            .find_by_name(recipient)
            .ok_or(RouteError::UnknownRecipient)?;
        if self.blocks.is_blocked(target.id, sender.addr) {
            return Err(RouteError::BlockedByRecipient);
        }
        if self.blocks.is_blocked(id, target.addr) {
            return Err(RouteError::BlockedBySender);
        }

        let msg = ServerMessage::Direct {
            from: sender.name.clone(),
            text,
        };
        if msg.to_string().len() > MAX_PAYLOAD {
            return Err(RouteError::MessageTooLong);
        }

        target.try_send(msg).map_err(|e| {
            warn!("Dropped DM to {}: {}", target.display_name(), e);
            RouteError::Undeliverable
        })?;
        debug!("DM from {} to {}", sender.name, target.name);
        Ok(())
    }
}
