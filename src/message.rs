//! Message protocol definitions
//!
//! Client → server frames are parsed into a `Command` using the
//! space-delimited `>command` grammar; anything else is chat text.
//! Server → client frames are `ServerMessage` values rendered to text.

use std::fmt;

use crate::error::{BlockError, NameError, RouteError};

/// Client → Server command
///
/// Command words are matched exactly and case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `>username <name>`
    Username { name: String },
    /// `>dm <recipient> <text>`
    DirectMessage { recipient: String, text: String },
    /// `>block <name>`
    Block { name: String },
    /// `>unblock <name>`
    Unblock { name: String },
    /// `>dc` or `>relog`
    Disconnect,
    /// Any other frame
    Chat { text: String },
    /// Recognized command word with missing arguments
    Malformed { usage: &'static str },
}

impl Command {
    /// Parse a decoded frame
    pub fn parse(frame: &str) -> Self {
        let (word, rest) = match frame.split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (frame, ""),
        };

        match word {
            ">username" => match single_arg(rest) {
                Some(name) => Command::Username { name },
                None => Command::Malformed {
                    usage: ">username <name>",
                },
            },
            ">dm" => {
                let rest = rest.trim_start_matches(' ');
                match rest.split_once(' ') {
                    Some((recipient, text)) if !recipient.is_empty() && !text.is_empty() => {
                        Command::DirectMessage {
                            recipient: recipient.to_string(),
                            text: text.to_string(),
                        }
                    }
                    _ => Command::Malformed {
                        usage: ">dm <recipient> <message>",
                    },
                }
            }
            ">block" => match single_arg(rest) {
                Some(name) => Command::Block { name },
                None => Command::Malformed {
                    usage: ">block <name>",
                },
            },
            ">unblock" => match single_arg(rest) {
                Some(name) => Command::Unblock { name },
                None => Command::Malformed {
                    usage: ">unblock <name>",
                },
            },
            ">dc" | ">relog" if rest.is_empty() => Command::Disconnect,
            _ => Command::Chat {
                text: frame.to_string(),
            },
        }
    }
}

fn single_arg(rest: &str) -> Option<String> {
    let arg = rest.trim_matches(' ');
    (!arg.is_empty()).then(|| arg.to_string())
}

/// Server → Client frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Initial name prompt
    UsernamePrompt,
    /// Prompt after a rejected name
    RetryPrompt,
    /// `[SERVER]` acknowledgment or error
    Server(String),
    /// Relayed broadcast
    Chat { from: String, text: String },
    /// Relayed direct message
    Direct { from: String, text: String },
}

impl ServerMessage {
    pub fn server(text: impl Into<String>) -> Self {
        ServerMessage::Server(text.into())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::UsernamePrompt => write!(f, "Username: "),
            ServerMessage::RetryPrompt => write!(f, "Pick a different username: "),
            ServerMessage::Server(text) => write!(f, "[SERVER] {}", text),
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::Direct { from, text } => write!(f, "[DM] {}: {}", from, text),
        }
    }
}

impl From<NameError> for ServerMessage {
    fn from(err: NameError) -> Self {
        let text = match err {
            NameError::Invalid => "Usernames must be non-empty and contain no spaces.",
            NameError::Forbidden => "You can't use that username.",
            NameError::Unchanged => "You own this name already.",
            NameError::Taken => "Someone owns this name already.",
        };
        ServerMessage::server(text)
    }
}

/// Block errors need the target name for context
impl From<(BlockError, &str)> for ServerMessage {
    fn from((err, name): (BlockError, &str)) -> Self {
        let text = match err {
            BlockError::UnknownUser => format!("Client {} does not exist.", name),
            BlockError::SelfBlock => "You can't block yourself.".to_string(),
            BlockError::AlreadyBlocked => format!("Client {} was already blocked.", name),
            BlockError::NotBlocked => format!("Client {} was not blocked.", name),
        };
        ServerMessage::Server(text)
    }
}

/// Route errors need the recipient name for context
impl From<(RouteError, &str)> for ServerMessage {
    fn from((err, recipient): (RouteError, &str)) -> Self {
        let text = match err {
            RouteError::SelfDM => "You can't DM yourself.".to_string(),
            RouteError::UnknownRecipient => "The recipient does not exist.".to_string(),
            RouteError::BlockedByRecipient => {
                format!("Client {} has blocked you. DM was not sent.", recipient)
            }
            RouteError::BlockedBySender => {
                format!("You blocked the Client {}. DM was not sent.", recipient)
            }
            RouteError::Undeliverable => {
                format!(
                    "Client {} is not accepting messages right now. DM was not sent.",
                    recipient
                )
            }
            RouteError::MessageTooLong => "Message too long. It was not sent.".to_string(),
            RouteError::Usage(usage) => format!("Usage: {}", usage),
        };
        ServerMessage::Server(text)
    }
}
