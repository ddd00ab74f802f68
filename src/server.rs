//! ChatServer Actor implementation
//!
//! The central actor that owns the router and with it the session registry,
//! username directory and block lists. Handlers reach shared state only by
//! sending `ServerCommand`s, so each command runs to completion before the
//! next one starts.

use std::net::SocketAddr;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::directory::UsernameDirectory;
use crate::error::NameError;
use crate::message::ServerMessage;
use crate::router::{Outcome, Router};
use crate::types::ClientId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        addr: SocketAddr,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect { client_id: ClientId },
    /// Registration attempt
    SetName {
        client_id: ClientId,
        name: String,
        respond_to: oneshot::Sender<Result<(), NameError>>,
    },
    /// Frame from an active session
    Route {
        client_id: ClientId,
        frame: String,
        respond_to: oneshot::Sender<Outcome>,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    router: Router,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self::with_directory(receiver, UsernameDirectory::default())
    }

    pub fn with_directory(
        receiver: mpsc::Receiver<ServerCommand>,
        directory: UsernameDirectory,
    ) -> Self {
        Self {
            router: Router::new(directory),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                client_id,
                addr,
                sender,
            } => {
                if self.router.connect(client_id, addr, sender) {
                    info!("Client {} connected from {}", client_id, addr);
                }
                debug!("Total sessions: {}", self.router.registry().len());
            }
            ServerCommand::Disconnect { client_id } => {
                if let Some(session) = self.router.disconnect(client_id) {
                    info!(
                        "Client {} ({}) disconnected",
                        client_id,
                        session.display_name()
                    );
                }
                debug!("Total sessions: {}", self.router.registry().len());
            }
            ServerCommand::SetName {
                client_id,
                name,
                respond_to,
            } => {
                let result = self.router.set_name(client_id, &name);
                // Handler gone means the session is being torn down anyway
                let _ = respond_to.send(result);
            }
            ServerCommand::Route {
                client_id,
                frame,
                respond_to,
            } => {
                debug!("Routing frame from {}: {}", client_id, frame);
                let outcome = self.router.dispatch(client_id, &frame);
                let _ = respond_to.send(outcome);
            }
        }
    }
}
