//! Server configuration.
//!
//! Defaults mirror the original device build: port 80, a single upgraded
//! client and a `www` content directory. A YAML file named by
//! `SWITCHYARD_CONFIG` replaces the defaults, and a few environment variables
//! override individual values afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable holding the path of a YAML config file.
pub const CONFIG_ENV: &str = "SWITCHYARD_CONFIG";
pub const PORT_ENV: &str = "SWITCHYARD_PORT";
pub const ROOT_ENV: &str = "SWITCHYARD_ROOT";
pub const MAX_CONNECTIONS_ENV: &str = "SWITCHYARD_MAX_CONNECTIONS";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Listening port used by the binary; `Server::start` takes its own.
    pub port: u16,
    /// Ceiling on concurrently upgraded clients.
    pub max_connections: usize,
    pub backlog: u32,
    /// Minimum delay between two scheduling ticks.
    pub tick_interval_ms: u64,
    /// Upper bound for reading a new connection's request head.
    pub request_timeout_ms: u64,
    /// Upper bound for a single message write on an upgraded connection.
    pub write_timeout_ms: u64,
    /// How long a closing HTTP connection waits for the peer to hang up.
    pub close_linger_ms: u64,
    /// Largest request head accepted before dispatching.
    pub max_request_head: usize,
    /// Value of the `Server` response header.
    pub server_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            max_connections: 1,
            backlog: 16,
            tick_interval_ms: 10,
            request_timeout_ms: 2_000,
            write_timeout_ms: 1_000,
            close_linger_ms: 100,
            max_request_head: 4096,
            server_name: "switchyard".to_string(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("www"),
        }
    }
}

impl ServerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn close_linger(&self) -> Duration {
        Duration::from_millis(self.close_linger_ms)
    }
}

impl Config {
    /// Loads the configuration from `SWITCHYARD_CONFIG` (if set) and applies
    /// environment overrides on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("failed to parse YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {port}"))?;
        }
        if let Ok(root) = std::env::var(ROOT_ENV) {
            self.static_files.root = PathBuf::from(root);
        }
        if let Ok(max) = std::env::var(MAX_CONNECTIONS_ENV) {
            self.server.max_connections = max
                .parse()
                .with_context(|| format!("{MAX_CONNECTIONS_ENV} is not a number: {max}"))?;
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_request_head < 16 {
            anyhow::bail!(
                "server.max_request_head must be at least 16 bytes, got {}",
                self.server.max_request_head
            );
        }
        Ok(())
    }
}
