//! Process configuration read from environment variables.
//!
//! # Responsibility
//! - Parse the store connection string into a typed `StoreUri`.
//! - Resolve optional logging and insert-policy settings with defaults.
//!
//! # Invariants
//! - `PEOPLE_STORE_URI` is required; every other key has a default.
//! - Unknown URI schemes are rejected instead of being treated as paths.

use crate::logging::default_log_level;
use crate::repo::person_repo::InsertPolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORE_URI_KEY: &str = "PEOPLE_STORE_URI";
pub const LOG_LEVEL_KEY: &str = "PEOPLE_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "PEOPLE_LOG_DIR";
pub const INSERT_POLICY_KEY: &str = "PEOPLE_INSERT_POLICY";

const MEMORY_URI: &str = "sqlite::memory:";

/// Location of the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    Memory,
    File(PathBuf),
}

impl StoreUri {
    /// Accepts `sqlite::memory:`, `sqlite://<path>`, `file:<path>` or a bare
    /// path.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Missing(STORE_URI_KEY));
        }
        if trimmed == MEMORY_URI || trimmed == ":memory:" {
            return Ok(Self::Memory);
        }

        let path = if let Some(rest) = trimmed.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("file:") {
            rest.strip_prefix("//").unwrap_or(rest)
        } else if let Some((scheme, _)) = trimmed.split_once("://") {
            return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
        } else {
            trimmed
        };

        if path.is_empty() {
            return Err(ConfigError::Missing(STORE_URI_KEY));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

impl Display for StoreUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "{MEMORY_URI}"),
            Self::File(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    UnsupportedScheme(String),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::UnsupportedScheme(scheme) => write!(
                f,
                "unsupported store scheme `{scheme}`; expected sqlite:// or file:"
            ),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for setting `{key}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreUri,
    pub log_level: String,
    /// Rolling log file directory; logs go to stderr when unset.
    pub log_dir: Option<String>,
    pub insert_policy: InsertPolicy,
}

impl AppConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = lookup(STORE_URI_KEY)
            .ok_or(ConfigError::Missing(STORE_URI_KEY))
            .and_then(|value| StoreUri::parse(&value))?;

        let log_level = non_blank(lookup(LOG_LEVEL_KEY))
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = non_blank(lookup(LOG_DIR_KEY));

        let insert_policy = match non_blank(lookup(INSERT_POLICY_KEY)) {
            Some(value) => InsertPolicy::parse(&value).ok_or(ConfigError::InvalidValue {
                key: INSERT_POLICY_KEY,
                value,
            })?,
            None => InsertPolicy::default(),
        };

        Ok(Self {
            store,
            log_level,
            log_dir,
            insert_policy,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
