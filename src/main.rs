//! Chat Relay Server - Entry Point
//!
//! Loads configuration, starts the ChatServer actor and accepts connections.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{handle_connection, AppError, ChatServer, ConnectionLimit, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Chat relay listening on {}", listener.local_addr()?);

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
    tokio::spawn(ChatServer::new(cmd_rx).run());

    info!("ChatServer actor started");

    let limit = ConnectionLimit::new(config.max_connections);

    // Connection accept loop
    loop {
        let Some(permit) = limit.acquire().await else {
            break;
        };

        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let outbound_capacity = config.outbound_capacity;

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr, cmd_tx, outbound_capacity).await
                    {
                        error!("Connection handler error: {}", e);
                    }
                    drop(permit);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }

    Ok(())
}
