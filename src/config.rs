//! Configuration Management System for TN3270R
//!
//! Settings live in a flat property map keyed by dotted names
//! (`connection.port`, `buffer.lockTimeoutMs`, ...). Every key has a default,
//! so a missing or partial JSON file still yields a usable configuration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TN3270Error};
use crate::telnet_negotiation::DEFAULT_TERMINAL_TYPE;

pub const HOST: &str = "connection.host";
pub const PORT: &str = "connection.port";
pub const TERMINAL_TYPE: &str = "connection.terminalType";
pub const CONNECT_TIMEOUT_MS: &str = "connection.connectTimeoutMs";
pub const NEGOTIATION_TIMEOUT_MS: &str = "telnet.negotiationTimeoutMs";
pub const LOCK_TIMEOUT_MS: &str = "buffer.lockTimeoutMs";
pub const COMPLETION_TIMEOUT_MS: &str = "buffer.completionTimeoutMs";
pub const READER_JOIN_TIMEOUT_MS: &str = "session.readerJoinTimeoutMs";
pub const IGNORE_ACK_COUNT: &str = "protocol.ignoreAckCount";
pub const STRICT_COMMANDS: &str = "protocol.strictCommands";

const TIMEOUT_KEYS: [&str; 5] = [
    CONNECT_TIMEOUT_MS,
    NEGOTIATION_TIMEOUT_MS,
    LOCK_TIMEOUT_MS,
    COMPLETION_TIMEOUT_MS,
    READER_JOIN_TIMEOUT_MS,
];

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "TN3270R_CONFIG";

/// Supported configuration value types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl ConfigValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Property-based session configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    properties: HashMap<String, ConfigValue>,
    config_resource: PathBuf,
}

impl SessionConfig {
    /// Defaults, remembering `config_resource` as the place to save to
    pub fn new(config_resource: impl Into<PathBuf>) -> Self {
        let mut config = Self {
            properties: HashMap::new(),
            config_resource: config_resource.into(),
        };
        config.set_defaults();
        config
    }

    fn set_defaults(&mut self) {
        self.set_property(HOST, "");
        self.set_property(PORT, 23i64);
        self.set_property(TERMINAL_TYPE, DEFAULT_TERMINAL_TYPE);
        self.set_property(CONNECT_TIMEOUT_MS, 10_000i64);
        self.set_property(NEGOTIATION_TIMEOUT_MS, 5_000i64);
        self.set_property(LOCK_TIMEOUT_MS, 5_000i64);
        self.set_property(COMPLETION_TIMEOUT_MS, 5_000i64);
        self.set_property(READER_JOIN_TIMEOUT_MS, 1_000i64);
        self.set_property(IGNORE_ACK_COUNT, false);
        self.set_property(STRICT_COMMANDS, false);
    }

    pub fn get_string_property(&self, key: &str) -> Option<String> {
        self.properties.get(key)?.as_string().map(str::to_string)
    }

    pub fn get_int_property(&self, key: &str) -> Option<i64> {
        self.properties.get(key)?.as_integer()
    }

    pub fn get_boolean_property(&self, key: &str) -> Option<bool> {
        self.properties.get(key)?.as_boolean()
    }

    pub fn set_property<T: Into<ConfigValue>>(&mut self, key: &str, value: T) {
        self.properties.insert(key.to_string(), value.into());
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    pub fn config_resource(&self) -> &Path {
        &self.config_resource
    }

    pub fn host(&self) -> String {
        self.get_string_property(HOST).unwrap_or_default()
    }

    /// Configured port; values that do not fit a port number read as 0
    pub fn port(&self) -> u16 {
        self.get_int_property(PORT)
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(0)
    }

    pub fn terminal_type(&self) -> String {
        self.get_string_property(TERMINAL_TYPE)
            .unwrap_or_else(|| DEFAULT_TERMINAL_TYPE.to_string())
    }

    fn millis(&self, key: &str) -> Duration {
        let ms = self.get_int_property(key).unwrap_or(0).max(0) as u64;
        Duration::from_millis(ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.millis(CONNECT_TIMEOUT_MS)
    }

    pub fn negotiation_timeout(&self) -> Duration {
        self.millis(NEGOTIATION_TIMEOUT_MS)
    }

    pub fn lock_timeout(&self) -> Duration {
        self.millis(LOCK_TIMEOUT_MS)
    }

    pub fn completion_timeout(&self) -> Duration {
        self.millis(COMPLETION_TIMEOUT_MS)
    }

    pub fn reader_join_timeout(&self) -> Duration {
        self.millis(READER_JOIN_TIMEOUT_MS)
    }

    pub fn ignore_ack_count(&self) -> bool {
        self.get_boolean_property(IGNORE_ACK_COUNT).unwrap_or(false)
    }

    pub fn strict_commands(&self) -> bool {
        self.get_boolean_property(STRICT_COMMANDS).unwrap_or(false)
    }

    /// Check value ranges. The host is checked when connecting.
    pub fn validate(&self) -> Result<()> {
        if self.port() == 0 {
            return Err(TN3270Error::config(PORT, "must be between 1 and 65535"));
        }
        if self.terminal_type().trim().is_empty() {
            return Err(TN3270Error::config(TERMINAL_TYPE, "must not be empty"));
        }
        for key in TIMEOUT_KEYS {
            if self.millis(key).is_zero() {
                return Err(TN3270Error::config(key, "must be a positive number of milliseconds"));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.properties)?)
    }

    /// Merge properties from JSON over the current values
    pub fn from_json(&mut self, json: &str) -> Result<()> {
        let loaded: HashMap<String, ConfigValue> = serde_json::from_str(json)?;
        self.properties.extend(loaded);
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(default_config_path())
    }
}

/// Config file location: `$TN3270R_CONFIG`, then the platform config
/// directory, then `./session.json`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("tn3270r").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}

/// Load the configuration at `path`. A missing file yields defaults.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let mut config = SessionConfig::new(path);
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(config);
    }

    let json = fs::read_to_string(path)?;
    config.from_json(&json)?;
    info!("loaded configuration from {}", path.display());
    Ok(config)
}

/// Write the configuration to its `config_resource` path
pub fn save_config(config: &SessionConfig) -> Result<()> {
    let path = config.config_resource();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, config.to_json()?)?;
    debug!("saved configuration to {}", path.display());
    Ok(())
}
