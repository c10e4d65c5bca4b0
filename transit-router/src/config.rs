//! Engine configuration.
//!
//! Every field has a default, so a configuration file only needs to name
//! what it changes:
//!
//! ```toml
//! snapshot_path = "/var/cache/transit-router/graph.json"
//! feed_dir = "/srv/gtfs"
//!
//! [router.night_window]
//! start_hour = 0
//! end_hour = 5
//!
//! [build.transfers]
//! street_max_distance_m = 400.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::network::{BuildPolicy, PolicyError};
use crate::planner::RouterConfig;

/// Errors loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] PolicyError),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the network snapshot is stored.
    pub snapshot_path: PathBuf,
    /// GTFS directory the network is built from.
    pub feed_dir: PathBuf,
    pub router: RouterConfig,
    pub build: BuildPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("transit_graph.json"),
            feed_dir: PathBuf::from("gtfs"),
            router: RouterConfig::default(),
            build: BuildPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.router.validate()?;
        self.build.validate()?;
        Ok(())
    }
}
