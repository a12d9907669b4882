//! Resolver configuration, optionally read from ~/.massgeo/config.json.
//!
//! Every field has a default, so a config file only needs the keys it changes.

use super::policy::ConfidencePolicy;
use super::projection::{EPSG_26986, EPSG_4326};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MASSGIS_ENDPOINT: &str = "https://arcgisserver.digital.mass.gov/arcgisserver/rest/services/CensusTIGER2010/GeocodeServer/findAddressCandidates";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub endpoint: String,
    /// proj definition of the coordinates the service returns
    pub source_crs: String,
    /// proj definition of the coordinates handed to callers
    pub target_crs: String,
    /// Spatial reference the service is expected to report (26986 for MassGIS)
    pub expected_wkid: Option<u32>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub policy: ConfidencePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: MASSGIS_ENDPOINT.to_string(),
            source_crs: EPSG_26986.to_string(),
            target_crs: EPSG_4326.to_string(),
            expected_wkid: Some(26986),
            timeout_secs: 10,
            user_agent: format!("massgeo/{}", env!("CARGO_PKG_VERSION")),
            policy: ConfidencePolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".massgeo")
            .join("config.json")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        self.policy.validate().map_err(ConfigError::Invalid)
    }
}
