//! Process configuration loaded from the environment.
//!
//! # Responsibility
//! - Load an optional `.env` file, then read `PEOPLE_*` variables.
//! - Validate the connection string before any connection attempt.
//!
//! # Invariants
//! - `PEOPLE_DB_URI` is required and must parse as a `ConnectionTarget`.
//! - Variables already set in the process win over `.env` entries.

use crate::db::ConnectionTarget;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_URI_VAR: &str = "PEOPLE_DB_URI";
pub const LOG_LEVEL_VAR: &str = "PEOPLE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "PEOPLE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue { var: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(var) => write!(f, "environment variable `{var}` is not set"),
            Self::InvalidValue { var, message } => {
                write!(f, "environment variable `{var}` is invalid: {message}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_target: ConnectionTarget,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `.env` (when present) and reads configuration from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal; real variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_uri = lookup(DB_URI_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVar(DB_URI_VAR))?;
        let db_target =
            db_uri
                .parse::<ConnectionTarget>()
                .map_err(|err| ConfigError::InvalidValue {
                    var: DB_URI_VAR,
                    message: err.to_string(),
                })?;

        let log_level = lookup(LOG_LEVEL_VAR)
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_log_level().to_string());

        let log_dir = match lookup(LOG_DIR_VAR).map(|value| value.trim().to_string()) {
            Some(dir) if !dir.is_empty() => {
                let path = PathBuf::from(&dir);
                if !path.is_absolute() {
                    return Err(ConfigError::InvalidValue {
                        var: LOG_DIR_VAR,
                        message: format!("must be an absolute path, got `{dir}`"),
                    });
                }
                Some(path)
            }
            _ => None,
        };

        Ok(Self {
            db_target,
            log_level,
            log_dir,
        })
    }
}
