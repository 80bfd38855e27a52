//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use fox_remote_core::protocol_constants::DEFAULT_PORT;
use fox_remote_core::Track;
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    /// Override: `FOX_REMOTE_BIND_ADDRESS`
    pub bind_address: IpAddr,

    /// Port to bind the HTTP server to.
    /// Override: `FOX_REMOTE_BIND_PORT`
    pub bind_port: u16,

    /// Milliseconds between playback progress updates.
    /// Override: `FOX_REMOTE_TICK_INTERVAL_MS`
    pub tick_interval_ms: u64,

    /// Whether the player starts with an account logged in.
    pub logged_in: bool,

    /// Playlist loaded into the player at startup.
    pub tracks: Vec<Track>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: DEFAULT_PORT,
            tick_interval_ms: 1000,
            logged_in: false,
            tracks: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.bind_port)
    }

    /// Interval between progress ticks, never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup("FOX_REMOTE_BIND_ADDRESS").and_then(|v| v.parse().ok()) {
            self.bind_address = address;
        }

        if let Some(port) = lookup("FOX_REMOTE_BIND_PORT").and_then(|v| v.parse().ok()) {
            self.bind_port = port;
        }

        if let Some(interval) = lookup("FOX_REMOTE_TICK_INTERVAL_MS").and_then(|v| v.parse().ok())
        {
            self.tick_interval_ms = interval;
        }
    }
}
