//! Pool configuration, read from a TOML file.
//!
//! ```toml
//! [pools.default]
//! root = "/srv/bundles"
//! title = "Main pool"
//!
//! [pools.backup]
//! root = "/mnt/backup/bundles"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PoolError, PoolResult};
use crate::pool::Pool;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "BUNDLE_CONFIG";

/// Name of the pool used when none is given.
pub const DEFAULT_POOL: &str = "default";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pools: BTreeMap<String, PoolConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        toml::from_str(text).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }

    /// Load from `path`. A missing file yields an empty configuration.
    pub fn load(path: &Path) -> PoolResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loading configuration");
                Self::from_toml_str(&text).map_err(|e| match e {
                    PoolError::InvalidConfig(reason) => {
                        PoolError::InvalidConfig(format!("{}: {reason}", path.display()))
                    }
                    other => other,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file");
                Ok(Self::default())
            }
            Err(e) => Err(PoolError::io("read", path, e)),
        }
    }

    /// Resolve the config file location: explicit path, then
    /// `$BUNDLE_CONFIG`, then `<config dir>/bundle/config.toml`.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("bundle").join("config.toml"))
    }

    /// Look up a configured pool by name.
    pub fn pool(&self, name: &str) -> PoolResult<Pool> {
        let entry = self
            .pools
            .get(name)
            .ok_or_else(|| PoolError::PoolNotFound(name.to_string()))?;
        if entry.root.as_os_str().is_empty() {
            return Err(PoolError::InvalidConfig(format!(
                "pool '{name}' has no root directory configured"
            )));
        }
        let title = entry
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| name.to_string());
        Ok(Pool::new(name, &entry.root, title))
    }

    /// Every configured pool, in name order.
    pub fn all_pools(&self) -> PoolResult<Vec<Pool>> {
        self.pools.keys().map(|name| self.pool(name)).collect()
    }
}
