mod permissions;
mod server;
mod telemetry;


pub use permissions::*;
pub use server::*;
pub use telemetry::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "actroute.toml";

/// Top-level configuration for the actroute server, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActRouteConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Caller permission sources.
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// OpenTelemetry distributed tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ActRouteConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load configuration from `path`. Returns `Ok(None)` when the file does
    /// not exist so callers can fall back to defaults.
    pub fn load(path: &Path) -> Result<Option<Self>, ServerError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents).map(Some)
    }
}
