//! Layered configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults.
//! 2. `config.toml` in the platform configuration directory.
//! 3. An explicit file passed by the caller (TOML, YAML or JSON, picked by
//!    extension).
//! 4. `SCRIPTORIUM_`-prefixed environment variables, with `__` separating
//!    nested keys (e.g. `SCRIPTORIUM_RESOURCES__TIMEOUT_MS=5000`).

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};
pub use scriptorium_manager::ManagerConfig;

const ENV_PREFIX: &str = "SCRIPTORIUM_";
const CONFIG_FILE: &str = "config.toml";
const CACHE_FILE: &str = "resources.sqlite";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "scriptorium", "scriptorium")
}

/// Where cached resources are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite database file. Defaults to the platform cache directory.
    pub path: Option<PathBuf>,
    /// Keep everything in memory; nothing survives the process.
    pub in_memory: bool,
}
impl CacheConfig {
    /// The database file to open, if any: the configured path, or the
    /// platform default.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| project_dirs().map(|dirs| dirs.cache_dir().join(CACHE_FILE)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resources: ManagerConfig,
    pub cache: CacheConfig,
}
impl Config {
    /// Load and validate configuration from every source.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(explicit)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// The merged provider stack, before extraction.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(dirs) = project_dirs() {
            figment = figment.merge(Toml::file(dirs.config_dir().join(CONFIG_FILE)));
        }
        if let Some(path) = explicit {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config file: {}", path.display()))),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<()> {
        let resources = &self.resources;
        if resources.max_retry_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("resources.max_retry_attempts must be at least 1".to_string()));
        }
        if resources.timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid("resources.timeout_ms must be greater than 0".to_string()));
        }
        if resources.cache_expiry_hours == 0 {
            exn::bail!(ErrorKind::Invalid("resources.cache_expiry_hours must be greater than 0".to_string()));
        }
        if self.cache.in_memory && self.cache.path.is_some() {
            exn::bail!(ErrorKind::Invalid("cache.path cannot be combined with cache.in_memory".to_string()));
        }
        Ok(())
    }
}
