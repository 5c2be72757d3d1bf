//! Controller configuration: structs, parsing, and validation.
//!
//! - `common`: `ConfigError` and shared helpers
//! - `agent`: logging settings
//! - `maps`: pinned map location and locking

mod agent;
mod common;
mod maps;

pub use agent::{AgentInfo, LogFormat, LogLevel};
pub use common::ConfigError;
pub use maps::MapsConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::warn_if_world_writable;

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentInfo,

    #[serde(default)]
    pub maps: MapsConfig,
}

impl AgentConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        warn_if_world_writable(path, "config file");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load `path`, falling back to defaults when it does not exist and
    /// `allow_missing` is set (used for the default config path only).
    pub fn load_or_default(path: &Path, allow_missing: bool) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io(ref e))
                if allow_missing && e.kind() == std::io::ErrorKind::NotFound =>
            {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.maps.validate()
    }
}
