//! Configuration file discovery and loading

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use spacewalk_core::error::MethodError;
use crate::{ConfigResult, server::ServerConfig, up2date::parse_up2date};

/// System-wide up2date configuration
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sysconfig/rhn/up2date";

/// Environment variable overriding the configuration path
pub const CONFIG_PATH_ENV: &str = "SPACEWALK_CONFIG";

/// Where the configuration path came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` on the command line
    CommandLine,
    /// The `SPACEWALK_CONFIG` environment variable
    Environment,
    /// The system default path
    Default,
}

/// Loads the server configuration from an up2date file
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: Utf8PathBuf,
    source: ConfigSource,
}

impl ConfigLoader {
    /// Loader for an explicit file
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: ConfigSource::CommandLine,
        }
    }

    /// Pick the configuration path: explicit argument, then environment,
    /// then the system default
    pub fn resolve(explicit: Option<Utf8PathBuf>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self {
                path: path.into(),
                source: ConfigSource::Environment,
            },
            _ => Self {
                path: DEFAULT_CONFIG_PATH.into(),
                source: ConfigSource::Default,
            },
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Read and validate the configuration file
    pub async fn load(&self) -> ConfigResult<ServerConfig> {
        debug!("Loading configuration from {} ({:?})", self.path, self.source);
        load_from_file(&self.path).await
    }
}

/// Load server configuration from an up2date file
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<ServerConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MethodError::config("config", format!("failed to read {}: {}", path, e)))?;

    let up2date = parse_up2date(&content).map_err(|e| match e {
        MethodError::Config { field, reason } => MethodError::Config {
            field,
            reason: format!("in file {}: {}", path, reason),
        },
        other => other,
    })?;

    ServerConfig::from_up2date(&up2date)
}
