//! Server configuration
//!
//! The bind address comes from the first command-line argument, then
//! `RELAY_ADDR`; limits come from `RELAY_*` environment variables.

use crate::error::ConfigError;

/// Default server address
pub const DEFAULT_ADDR: &str = "0.0.0.0:5050";

/// Default concurrent connection limit
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default per-connection outbound queue size
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_connections: usize,
    pub outbound_capacity: usize,
    pub command_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            command_capacity: CHANNEL_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load from process arguments and environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// Load from an optional address argument and a variable lookup
    pub fn from_sources<F>(addr_arg: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = addr_arg
            .or_else(|| lookup("RELAY_ADDR"))
            .unwrap_or(defaults.bind_addr);

        Ok(Self {
            bind_addr,
            max_connections: parse_limit(
                "RELAY_MAX_CONNECTIONS",
                lookup("RELAY_MAX_CONNECTIONS"),
                defaults.max_connections,
            )?,
            outbound_capacity: parse_limit(
                "RELAY_OUTBOUND_CAPACITY",
                lookup("RELAY_OUTBOUND_CAPACITY"),
                defaults.outbound_capacity,
            )?,
            command_capacity: defaults.command_capacity,
        })
    }
}

fn parse_limit(
    key: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}
