//! Connection handler
//!
//! Drives one client connection through `Connecting → Registering →
//! Active → Disconnected`. Frames are read with the length-prefixed codec
//! and handed to the ChatServer actor; outbound frames go through a
//! bounded queue drained by a dedicated writer task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{AppError, FramingError};
use crate::message::{Command, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

/// How long the writer may keep flushing queued frames after the session ends
const WRITER_LINGER: Duration = Duration::from_secs(5);

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Registering,
    Active,
    Disconnected,
}

/// Caps the number of connections served at once
#[derive(Debug, Clone)]
pub struct ConnectionLimit {
    permits: Arc<Semaphore>,
    max: usize,
}

impl ConnectionLimit {
    pub fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Wait for a free slot; the slot is released when the permit drops
    ///
    /// Returns `None` once the limit has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        if self.is_saturated() {
            warn!("Connection limit of {} reached, waiting for a slot", self.max);
        }
        self.permits.clone().acquire_owned().await.ok()
    }

    pub fn close(&self) {
        self.permits.close();
    }
}

/// Handle a new connection until it disconnects
///
/// Errors end this connection only; the session is always removed from the
/// server before returning.
pub async fn handle_connection<S>(
    stream: S,
    peer_addr: SocketAddr,
    cmd_tx: mpsc::Sender<ServerCommand>,
    outbound_capacity: usize,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let client_id = ClientId::new();
    debug!("Client {} accepted from {}", client_id, peer_addr);

    // Server -> client frames
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(outbound_capacity);
    let mut write_task = tokio::spawn(write_loop(writer, msg_rx, client_id));

    let result = run_session(&mut reader, client_id, peer_addr, &cmd_tx, &msg_tx).await;

    // Disconnected: the actor drops the session's sender, which lets the
    // writer drain and finish.
    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;
    drop(msg_tx);

    if tokio::time::timeout(WRITER_LINGER, &mut write_task)
        .await
        .is_err()
    {
        warn!("Writer for {} did not finish, aborting", client_id);
        write_task.abort();
    }

    info!("Client {} ({}) closed", client_id, peer_addr);
    result
}

async fn run_session<R>(
    reader: &mut R,
    client_id: ClientId,
    peer_addr: SocketAddr,
    cmd_tx: &mpsc::Sender<ServerCommand>,
    msg_tx: &mpsc::Sender<ServerMessage>,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    let mut state = ConnectionState::Connecting;

    loop {
        debug!("Client {} state {:?}", client_id, state);
        state = match state {
            ConnectionState::Connecting => {
                cmd_tx
                    .send(ServerCommand::Connect {
                        client_id,
                        addr: peer_addr,
                        sender: msg_tx.clone(),
                    })
                    .await
                    .map_err(|_| AppError::ChannelSend)?;
                enqueue(msg_tx, ServerMessage::UsernamePrompt).await?;
                ConnectionState::Registering
            }
            ConnectionState::Registering => match next_frame(reader, client_id).await? {
                Some(frame) if Command::parse(&frame) == Command::Disconnect => {
                    ConnectionState::Disconnected
                }
                Some(name) => {
                    let (respond_to, rx) = oneshot::channel();
                    cmd_tx
                        .send(ServerCommand::SetName {
                            client_id,
                            name,
                            respond_to,
                        })
                        .await
                        .map_err(|_| AppError::ChannelSend)?;

                    match rx.await.map_err(|_| AppError::ServerClosed)? {
                        Ok(()) => {
                            enqueue(msg_tx, ServerMessage::server("Username updated.")).await?;
                            ConnectionState::Active
                        }
                        Err(e) => {
                            enqueue(msg_tx, e.into()).await?;
                            enqueue(msg_tx, ServerMessage::RetryPrompt).await?;
                            ConnectionState::Registering
                        }
                    }
                }
                None => ConnectionState::Disconnected,
            },
            ConnectionState::Active => match next_frame(reader, client_id).await? {
                Some(frame) => {
                    let (respond_to, rx) = oneshot::channel();
                    cmd_tx
                        .send(ServerCommand::Route {
                            client_id,
                            frame,
                            respond_to,
                        })
                        .await
                        .map_err(|_| AppError::ChannelSend)?;

                    let outcome = rx.await.map_err(|_| AppError::ServerClosed)?;
                    enqueue(msg_tx, outcome.reply).await?;
                    if outcome.disconnect {
                        ConnectionState::Disconnected
                    } else {
                        ConnectionState::Active
                    }
                }
                None => ConnectionState::Disconnected,
            },
            ConnectionState::Disconnected => return Ok(()),
        };
    }
}

/// Read the next frame, treating a reset like a clean close
async fn next_frame<R>(reader: &mut R, client_id: ClientId) -> Result<Option<String>, AppError>
where
    R: AsyncRead + Unpin,
{
    match codec::read_frame(reader).await {
        Ok(frame) => Ok(frame),
        Err(FramingError::ConnectionReset) => {
            debug!("Client {} reset the connection", client_id);
            Ok(None)
        }
        Err(e) => {
            warn!("Framing error from {}: {}", client_id, e);
            Err(e.into())
        }
    }
}

async fn enqueue(msg_tx: &mpsc::Sender<ServerMessage>, msg: ServerMessage) -> Result<(), AppError> {
    msg_tx.send(msg).await.map_err(|_| AppError::ChannelSend)
}

async fn write_loop<W>(mut writer: W, mut msg_rx: mpsc::Receiver<ServerMessage>, client_id: ClientId)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = msg_rx.recv().await {
        if let Err(e) = codec::write_frame(&mut writer, &msg.to_string()).await {
            debug!("Write to {} failed: {}", client_id, e);
            break;
        }
    }
    debug!("Write task ended for {}", client_id);

    let _ = writer.shutdown().await;
}
