//! Runtime configuration
//!
//! Defaults, optionally overridden by a JSON file named in
//! `CHAT_RELAY_CONFIG`, then by the first command line argument
//! (bind address).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_QUEUE_CAPACITY;
use crate::error::AppError;
use crate::persist::DEFAULT_LOG_PATH;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Channel buffer size for hub commands
pub const DEFAULT_HUB_CAPACITY: usize = 256;

/// Environment variable naming an optional JSON config file
pub const CONFIG_ENV: &str = "CHAT_RELAY_CONFIG";

/// What closing a room does to later traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosePolicy {
    /// Send the notice and mark closed; later joins and messages still go through
    #[default]
    NotifyOnly,
    /// Send the notice, then refuse joins and drop messages
    Seal,
}

/// Per-room settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Append-only message log
    pub log_path: PathBuf,
    /// Outbound queue size per client before it is dropped as too slow
    pub client_queue_capacity: usize,
    /// Buffered hub commands before senders wait
    pub hub_queue_capacity: usize,
    pub close_policy: ClosePolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            client_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            hub_queue_capacity: DEFAULT_HUB_CAPACITY,
            close_policy: ClosePolicy::default(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: String,
    pub room: RoomConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            room: RoomConfig::default(),
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Resolve configuration from the environment and command line
    pub fn load(args: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(addr) = args.into_iter().nth(1) {
            config.bind_addr = addr;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the channels can't be built with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.room.client_queue_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "room.client_queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.room.hub_queue_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "room.hub_queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.bind_addr.is_empty() {
            return Err(AppError::InvalidConfig("bind_addr is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.room.log_path, PathBuf::from("chat_log.txt"));
        assert_eq!(config.room.client_queue_capacity, 256);
        assert_eq!(config.room.hub_queue_capacity, 256);
        assert_eq!(config.room.close_policy, ClosePolicy::NotifyOnly);
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"room": {"close_policy": "seal", "client_queue_capacity": 8}}"#;
        let config = Config::from_json(json).unwrap();

        assert_eq!(config.bind_addr, DEFAULT_ADDR);
        assert_eq!(config.room.close_policy, ClosePolicy::Seal);
        assert_eq!(config.room.client_queue_capacity, 8);
        assert_eq!(config.room.hub_queue_capacity, DEFAULT_HUB_CAPACITY);
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let json = r#"{"room": {"client_queue_capacity": 0}}"#;
        assert!(matches!(
            Config::from_json(json),
            Err(AppError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_rejects_bad_json() {
        assert!(matches!(Config::from_json("{"), Err(AppError::Json(_))));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        std::fs::write(&path, r#"{"bind_addr": "0.0.0.0:9000"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }
}
