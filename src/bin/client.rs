//! Chat Relay Client
//!
//! Sends each stdin line as a frame and prints every frame received.
//! `>dc` exits after sending; `>relog` reconnects for a fresh session.

use std::env;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use chat_relay::codec;
use chat_relay::AppError;

/// Default server address
const DEFAULT_ADDR: &str = "127.0.0.1:5050";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'session: loop {
        let stream = TcpStream::connect(&addr).await?;
        debug!("Connected to {}", addr);
        let (mut reader, mut writer) = stream.into_split();

        // Server -> stdout
        let read_task = tokio::spawn(async move {
            loop {
                match codec::read_frame(&mut reader).await {
                    Ok(Some(frame)) => println!("{}", frame),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Connection error: {}", e);
                        break;
                    }
                }
            }
        });

        while let Some(line) = lines.next_line().await? {
            if let Err(e) = codec::write_frame(&mut writer, &line).await {
                warn!("Send failed: {}", e);
                read_task.abort();
                return Err(e.into());
            }
            match line.as_str() {
                ">dc" => {
                    let _ = read_task.await;
                    break 'session;
                }
                ">relog" => {
                    let _ = read_task.await;
                    continue 'session;
                }
                _ => {}
            }
        }

        // stdin closed
        read_task.abort();
        break;
    }

    Ok(())
}
