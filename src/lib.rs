//! Multi-client TCP Chat Relay Library
//!
//! Clients connect over TCP, register a unique display name, and exchange
//! broadcast or direct messages, with per-client blocking of unwanted
//! senders. Every message on the wire is a length-prefixed UTF-8 frame.
//!
//! # Features
//! - Fixed-width decimal length framing with exact-length reads
//! - Unique usernames with a reserved-name list
//! - Broadcast chat with mutual block suppression
//! - Direct messages vetoed by a block in either direction
//! - Blocks keyed on peer address, so they survive renames
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the registry and block lists
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{ChatServer, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:5050").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!
//!     while let Ok((stream, addr)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, addr, cmd_tx, 64));
//!     }
//! }
//! ```

pub mod blocklist;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use blocklist::BlockListManager;
pub use config::ServerConfig;
pub use directory::UsernameDirectory;
pub use error::{AppError, BlockError, ConfigError, FramingError, NameError, RouteError, SendError};
pub use handler::{handle_connection, ConnectionLimit, ConnectionState};
pub use message::{Command, ServerMessage};
pub use registry::{SessionRegistry, Snapshot};
pub use router::{Outcome, Router};
pub use server::{ChatServer, ServerCommand};
pub use session::Session;
pub use types::ClientId;
