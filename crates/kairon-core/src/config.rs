//! Runtime configuration.
//!
//! Layering, lowest to highest: built-in defaults, an optional YAML/TOML
//! file, then `KAIRON__*` environment variables (`KAIRON__DATABASE__NAME`).

use crate::{
    db::backend::DEFAULT_MAX_ATTEMPTS,
    error::{Error, ErrorClass, ErrorOrigin},
    obs::LogConfig,
};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "KAIRON";

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Project the backing database belongs to.
    pub project_id: String,
    pub database: DatabaseConfig,
    pub logging: LogConfig,
}

///
/// DatabaseConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backend kind; see [`BackendKind`](crate::db::backend::BackendKind).
    pub backend: String,
    pub name: String,
    /// Times a transaction body may run before a commit conflict is final.
    pub max_attempts: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            name: "(default)".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Load configuration from `path` (if it exists) and the environment.
pub fn load(path: impl AsRef<Path>) -> Result<Config, Error> {
    let path = path.as_ref();

    ConfigBuilder::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .and_then(|built| built.try_deserialize())
        .map_err(|err| {
            Error::new(
                ErrorClass::Internal,
                ErrorOrigin::Config,
                format!("failed to load config from '{}': {err}", path.display()),
            )
        })
}

/// Like [`load`], falling back to defaults when loading fails.
pub fn load_or_default(path: impl AsRef<Path>) -> Config {
    load(path).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "using default configuration");
        Config::default()
    })
}
