//! Error types for the chat relay
//!
//! Defines the framing, naming, blocking and routing errors reported to
//! clients, plus the connection-level errors that end a session.
//! Uses thiserror for ergonomic error definitions.

use std::io;

use thiserror::Error;

/// Application-level errors
///
/// Raised at the connection handler and entry point boundary. Any of these
/// ends the affected connection only.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or truncated frame (fatal for the connection)
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// The server actor dropped a request without answering
    #[error("Server closed")]
    ServerClosed,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Frame encode/decode errors
#[derive(Debug, Error)]
pub enum FramingError {
    /// Header bytes are not a decimal length
    #[error("invalid frame header {0:?}")]
    InvalidHeader(String),

    /// Payload longer than the header can describe
    #[error("frame payload of {0} bytes exceeds the maximum")]
    TooLong(usize),

    /// Connection closed in the middle of a frame
    #[error("connection closed mid-frame")]
    Truncated,

    /// Payload is not UTF-8
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Peer reset or aborted the connection
    #[error("connection reset by peer")]
    ConnectionReset,

    /// Any other transport failure
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FramingError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => FramingError::Truncated,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => FramingError::ConnectionReset,
            _ => FramingError::Io(err),
        }
    }
}

/// Username change rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    /// Empty or contains whitespace
    #[error("invalid username")]
    Invalid,

    /// Name is on the reserved list
    #[error("username is reserved")]
    Forbidden,

    /// Name equals the session's current name
    #[error("username unchanged")]
    Unchanged,

    /// Another active session holds the name
    #[error("username taken")]
    Taken,
}

/// Block/unblock rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    /// No active session has the given name
    #[error("unknown user")]
    UnknownUser,

    /// Target name is the caller's own
    #[error("cannot block yourself")]
    SelfBlock,

    /// Target address already in the caller's block set
    #[error("already blocked")]
    AlreadyBlocked,

    /// Target address not in the caller's block set
    #[error("not blocked")]
    NotBlocked,
}

/// Message routing rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Direct message addressed to the sender
    #[error("cannot DM yourself")]
    SelfDM,

    /// No active session has the recipient name
    #[error("unknown recipient")]
    UnknownRecipient,

    /// Recipient has blocked the sender
    #[error("blocked by recipient")]
    BlockedByRecipient,

    /// Sender has blocked the recipient
    #[error("recipient is blocked")]
    BlockedBySender,

    /// Recipient is registered but its outbound queue is full or closed
    #[error("recipient unreachable")]
    Undeliverable,

    /// Relayed frame would exceed the maximum payload
    #[error("message too long")]
    MessageTooLong,

    /// Command recognized but its arguments are missing
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric setting could not be parsed or is zero
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Message send errors
///
/// Occurs when a relayed frame cannot be queued for a recipient.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The recipient's outbound queue is full
    #[error("Channel full")]
    ChannelFull,
}
