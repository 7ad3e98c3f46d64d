//! Store configuration via `scopestore.toml`
//!
//! Mirrors the options a host passes when constructing a store: where the
//! backing server lives, which logical database to use, the key prefix shared
//! by every key the store writes, and the reconnection backoff.

use std::path::Path;
use std::time::Duration;

use scopestore_backend::RespOptions;
use scopestore_core::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "scopestore.toml";

/// Default physical key prefix
pub const DEFAULT_PREFIX: &str = "nodered:";

/// Reconnection backoff
///
/// Attempt `n` (1-based) waits `min(n * step_ms, max_delay_ms)`. Retries are
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Delay added per consecutive failed attempt
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// Upper bound on the delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_step_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    3000
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let ms = self
            .step_ms
            .saturating_mul(u64::from(attempt))
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Store configuration loaded from `scopestore.toml`.
///
/// # Example
///
/// ```toml
/// host = "127.0.0.1"
/// port = 6379
/// db = 0
/// prefix = "nodered:"
///
/// [reconnect]
/// step_ms = 100
/// max_delay_ms = 3000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Server host name or address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional password sent with `AUTH`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Logical database index
    #[serde(default)]
    pub db: u32,
    /// Prefix shared by every physical key this store writes
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Reconnection backoff
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            db: 0,
            prefix: default_prefix(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Config with the given key prefix and defaults elsewhere
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// `host:port` of the backing server
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection options for the RESP backend
    pub fn resp_options(&self) -> RespOptions {
        RespOptions {
            address: self.address(),
            password: self.password.clone(),
            db: self.db,
        }
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty host, port 0, a zero backoff step, or a
    /// cap below the step.
    pub fn validate(&self) -> StoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(StoreError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(StoreError::config("port must not be 0"));
        }
        if self.reconnect.step_ms == 0 {
            return Err(StoreError::config("reconnect.step_ms must be positive"));
        }
        if self.reconnect.max_delay_ms < self.reconnect.step_ms {
            return Err(StoreError::config(format!(
                "reconnect.max_delay_ms ({}) is below reconnect.step_ms ({})",
                self.reconnect.max_delay_ms, self.reconnect.step_ms
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# scopestore configuration
#
# Backing server
host = "127.0.0.1"
port = 6379
# password = "secret"            # optional, sent with AUTH
db = 0

# Prefix shared by every key this store writes. Stores sharing a server
# stay apart by using different prefixes.
prefix = "nodered:"

# Reconnection backoff: attempt n waits min(n * step_ms, max_delay_ms).
[reconnect]
step_ms = 100
max_delay_ms = 3000
"#
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| StoreError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            StoreError::Config(msg) => {
                StoreError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
