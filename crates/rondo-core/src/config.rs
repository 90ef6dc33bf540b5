//! Configuration system for rondo.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $RONDO_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/rondo/config.toml
//!   3. ~/.config/rondo/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RondoConfig {
    pub node: NodeSection,
    pub relay: RelaySection,
    pub registrar: RegistrarSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Name announced in hop signatures.
    pub name: String,
    /// Host other members use to reach this node.
    pub host: String,
    /// HTTP listen port.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    /// Round-trip wait window, seconds.
    pub timeout_secs: u64,
    /// Timeouts tolerated before the circuit breaker closes the ring.
    pub max_timeouts: u32,
}

/// Where to register at startup. An empty host means this node never
/// registers outward — it is the ring's origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarSection {
    pub host: String,
    pub port: u16,
}

impl RegistrarSection {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for RondoConfig {
    fn default() -> Self {
        Self {
            node: NodeSection::default(),
            relay: RelaySection::default(),
            registrar: RegistrarSection::default(),
        }
    }
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: "rondo-node".to_string(),
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_timeouts: 10,
        }
    }
}

impl Default for RegistrarSection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("rondo")
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
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RondoConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            RondoConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("RONDO_CONFIG")
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
            let text = toml::to_string_pretty(&RondoConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply RONDO_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RONDO_NODE__NAME") {
            self.node.name = v;
        }
        if let Ok(v) = std::env::var("RONDO_NODE__HOST") {
            self.node.host = v;
        }
        if let Ok(v) = std::env::var("RONDO_NODE__PORT") {
            if let Ok(p) = v.parse() {
                self.node.port = p;
            }
        }
        if let Ok(v) = std::env::var("RONDO_RELAY__TIMEOUT_SECS") {
            if let Ok(t) = v.parse() {
                self.relay.timeout_secs = t;
            }
        }
        if let Ok(v) = std::env::var("RONDO_RELAY__MAX_TIMEOUTS") {
            if let Ok(t) = v.parse() {
                self.relay.max_timeouts = t;
            }
        }
        if let Ok(v) = std::env::var("RONDO_REGISTRAR__HOST") {
            self.registrar.host = v;
        }
        if let Ok(v) = std::env::var("RONDO_REGISTRAR__PORT") {
            if let Ok(p) = v.parse() {
                self.registrar.port = p;
            }
        }
    }
}
