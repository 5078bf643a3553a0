//! Configuration system for Waypoint.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $WAYPOINT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/waypoint/config.toml
//!   3. ~/.config/waypoint/config.toml
//!
//! Fork heights and version floors are deliberately absent: they are
//! consensus rules and live in `fork::ForkSchedule::compiled`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ErrorKind;
use crate::identity::DEFAULT_IDENTITY_FILE;

/// Maximum tolerated |now - ping.timestamp|, in seconds. Not configurable.
pub const TIMESTAMP_SKEW_TOLERANCE_SECS: u64 = 60;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub identity: IdentityConfig,
    pub registry: RegistryConfig,
    pub api: ApiConfig,
    pub throttle: ThrottleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Mnemonic file. Generated on first run. Blank = `.directory_identity`.
    pub identity_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Drop a peer that has not pinged for this many seconds.
    pub entry_ttl_secs: u64,
    /// Hard cap on tracked peers. Oldest entries are evicted beyond it.
    pub max_entries: usize,
    /// How often the background task purges expired entries.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Requests per source IP per minute on /api routes. 0 = unlimited.
    pub max_requests_per_ip_per_minute: u32,
    /// Per-IP buckets kept in memory before the least recent are dropped.
    pub max_tracked_ips: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            registry: RegistryConfig::default(),
            api: ApiConfig::default(),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            identity_file: PathBuf::from(DEFAULT_IDENTITY_FILE),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            entry_ttl_secs: 180,
            max_entries: 100_000,
            sweep_interval_secs: 5,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_requests_per_ip_per_minute: 120,
            max_tracked_ips: 10_000,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("waypoint")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid setting {0}: {1}")]
    Invalid(&'static str, String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl DirectoryConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            DirectoryConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("WAYPOINT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&DirectoryConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Reject settings the registry cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "registry.max_entries",
                "must be greater than zero".into(),
            ));
        }
        if self.registry.entry_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "registry.entry_ttl_secs",
                "must be greater than zero".into(),
            ));
        }
        if self.registry.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "registry.sweep_interval_secs",
                "must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Apply WAYPOINT_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("WAYPOINT_IDENTITY__FILE") {
            self.identity.identity_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("WAYPOINT_REGISTRY__ENTRY_TTL_SECS") {
            if let Ok(n) = v.parse() {
                self.registry.entry_ttl_secs = n;
            }
        }
        if let Some(v) = lookup("WAYPOINT_REGISTRY__MAX_ENTRIES") {
            if let Ok(n) = v.parse() {
                self.registry.max_entries = n;
            }
        }
        if let Some(v) = lookup("WAYPOINT_API__BIND_ADDR") {
            self.api.bind_addr = v;
        }
        if let Some(v) = lookup("WAYPOINT_API__PORT") {
            if let Ok(p) = v.parse() {
                self.api.port = p;
            }
        }
        if let Some(v) = lookup("WAYPOINT_THROTTLE__MAX_REQUESTS_PER_IP_PER_MINUTE") {
            if let Ok(n) = v.parse() {
                self.throttle.max_requests_per_ip_per_minute = n;
            }
        }
    }
}
