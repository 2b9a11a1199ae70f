//! Exporter configuration.
//!
//! Everything here is read once at startup and stays immutable for the
//! lifetime of the process. The collector receives it explicitly rather
//! than looking anything up globally.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the Icecast server's own configuration file.
pub const DEFAULT_ICECAST_CONFIG: &str = "/etc/icecast/icecast.xml";

/// Mountpoint reported when none are configured.
pub const DEFAULT_MOUNTPOINT: &str = "/blissomradio";

/// Full configuration file format.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExporterConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Where the exporter listens for scrapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the `/metrics` endpoint to.
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: ([127, 0, 0, 1], 5555).into(),
        }
    }
}

/// The Icecast server being scraped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin of the Icecast server, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Whole-request timeout for the stats call, in seconds.
    pub timeout_secs: u64,
    /// Mountpoints to report on, in output order.
    pub mountpoints: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            mountpoints: vec![DEFAULT_MOUNTPOINT.to_string()],
        }
    }
}

impl UpstreamConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates the upstream section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "{}: scheme must be http or https",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.mountpoints.is_empty() {
            return Err(ConfigError::NoMountpoints);
        }
        for (i, mount) in self.mountpoints.iter().enumerate() {
            if mount.trim().is_empty() {
                return Err(ConfigError::EmptyMountpoint);
            }
            if self.mountpoints[..i].contains(mount) {
                return Err(ConfigError::DuplicateMountpoint(mount.clone()));
            }
        }
        Ok(())
    }
}

/// How the Icecast admin credentials are obtained.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum CredentialsConfig {
    /// Read `<authentication>` from the Icecast server's XML config.
    IcecastConfig { path: PathBuf },
    /// Use the given username and password.
    Static { username: String, password: String },
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self::IcecastConfig {
            path: PathBuf::from(DEFAULT_ICECAST_CONFIG),
        }
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IcecastConfig { path } => f
                .debug_struct("IcecastConfig")
                .field("path", path)
                .finish(),
            Self::Static { username, .. } => f
                .debug_struct("Static")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid upstream base url: {0}")]
    InvalidBaseUrl(String),
    #[error("upstream timeout must be at least one second")]
    InvalidTimeout,
    #[error("no mountpoints configured")]
    NoMountpoints,
    #[error("mountpoint identifiers must not be empty")]
    EmptyMountpoint,
    #[error("mountpoint configured more than once: {0}")]
    DuplicateMountpoint(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

impl ExporterConfig {
    /// Loads configuration from a TOML file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text and validates it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream.validate()
    }
}
