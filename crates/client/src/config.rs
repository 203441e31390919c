//! Client configuration.

use std::{fs, path::Path};

use ant_net_bootstrap::BootstrapArgs;
use ant_net_dialer::SwarmConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Client configuration, loadable from TOML.
///
/// ```toml
/// [bootstrap]
/// dial_timeout_secs = 10
/// target_connections = 2
///
/// [transport]
/// idle_timeout_secs = 120
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub bootstrap: BootstrapArgs,
    pub transport: SwarmConfig,
}

impl ClientConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load the configuration from the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
