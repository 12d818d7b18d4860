//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `host.toml`.
//!     loads configuration from file or falls back to defaults, then applies
//!     environment overrides (MOISTURE_BACKEND_URL, HOST, PORT).
//!
//! structure:
//!     - ServerConfig: where the relay listens.
//!     - BackendConfig: the external backend everything is forwarded to.
//!     - PollingConfig: how often the dashboard refreshes the selected sensor.
//!     - DashboardConfig: whether the in-process dashboard runs, and which api it polls.
//!     - LoggingConfig: default tracing filter.
//!
//! ==============================================================================

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BACKEND_URL: &str = "https://hinga-smart-server.vercel.app";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BACKEND_URL.to_string(), timeout_seconds: default_timeout() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_seconds: 30 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    /// api the dashboard polls; normally this relay's own /api
    pub api_base_url: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { enabled: true, api_base_url: "http://127.0.0.1:3000/api".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Where the running configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    /// no usable file; `rejected` holds files that exist but failed to load
    Defaults { rejected: Vec<(PathBuf, String)> },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!(path = %path.display(), "config loaded"),
            ConfigSource::Defaults { rejected } => {
                for (path, error) in rejected {
                    warn!(path = %path.display(), %error, "failed to load config");
                }
                warn!("no usable config file - using defaults");
            }
        }
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: HostConfig =
            toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback.
    ///
    /// runs before tracing is up, so nothing is logged here; pass the
    /// returned [`ConfigSource`] to [`ConfigSource::log`] once it is.
    pub fn load_or_default() -> (Self, ConfigSource) {
        let paths = [
            PathBuf::from("config").join("host.toml"),
            PathBuf::from("..").join("config").join("host.toml"),
        ];
        Self::load_first(&paths)
    }

    /// first path that exists and parses wins; the rest fall back to defaults
    pub fn load_first(paths: &[PathBuf]) -> (Self, ConfigSource) {
        let mut rejected = Vec::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::load(path) {
                Ok(config) => return (config, ConfigSource::File(path.clone())),
                Err(e) => rejected.push((path.clone(), e.to_string())),
            }
        }
        (Self::default(), ConfigSource::Defaults { rejected })
    }

    /// Apply HOST / PORT / MOISTURE_BACKEND_URL from the environment.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("MOISTURE_BACKEND_URL").filter(|u| !u.is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(host) = var("HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.polling.interval_seconds == 0 {
            anyhow::bail!("polling.interval_seconds must be at least 1");
        }
        if self.backend.base_url.trim().is_empty() {
            anyhow::bail!("backend.base_url must not be empty");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_seconds)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        info!(
            listen = %format!("{}:{}", self.server.host, self.server.port),
            backend = %self.backend.base_url,
            poll_interval_s = self.polling.interval_seconds,
            dashboard = self.dashboard.enabled,
            log_level = %self.logging.level,
            "host configuration"
        );
    }
}
