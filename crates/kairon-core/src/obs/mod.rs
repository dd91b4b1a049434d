//! Logging setup.
//!
//! Runtime code only emits `tracing` events; installing a subscriber is the
//! embedding binary's call, made once through [`init_logging`].

use crate::error::{Error, ErrorClass, ErrorOrigin};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Filter used when neither the config nor `RUST_LOG` names one.
pub const DEFAULT_FILTER: &str = "info,kairon=debug";

///
/// LogFormat
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-readable.
    Pretty,
    Compact,
    /// One JSON object per event.
    Json,
}

#[allow(clippy::derivable_impls)]
impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

///
/// LogConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub include_location: bool,
    pub include_target: bool,
    /// `EnvFilter` directive, e.g. `"info,kairon=debug"`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            include_location: cfg!(debug_assertions),
            include_target: true,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Resolve the effective filter: explicit config, then `RUST_LOG`,
    /// then [`DEFAULT_FILTER`].
    pub fn env_filter(&self) -> Result<EnvFilter, Error> {
        match &self.filter {
            Some(directive) => EnvFilter::try_new(directive).map_err(|err| {
                Error::new(
                    ErrorClass::Internal,
                    ErrorOrigin::Config,
                    format!("invalid log filter '{directive}': {err}"),
                )
            }),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
        }
    }
}

/// Install the global `fmt` subscriber described by `config`.
///
/// Fails (rather than panicking) if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let installed = match config.format {
        LogFormat::Pretty => subscriber.pretty().try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
    installed.map_err(|err| {
        Error::new(
            ErrorClass::Internal,
            ErrorOrigin::Config,
            format!("failed to initialise {:?} logger: {err}", config.format),
        )
    })?;

    tracing::info!(format = ?config.format, "logging initialised");

    Ok(())
}
