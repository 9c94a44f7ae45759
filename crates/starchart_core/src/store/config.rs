//! Store configuration read once at process start.
//!
//! # Invariants
//! - Required values are non-blank after trimming.
//! - The private key never appears in `Debug` output or logs.

use super::DocumentPath;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

pub const ENV_PROJECT_ID: &str = "STARCHART_PROJECT_ID";
pub const ENV_CLIENT_EMAIL: &str = "STARCHART_CLIENT_EMAIL";
pub const ENV_PRIVATE_KEY: &str = "STARCHART_PRIVATE_KEY";
pub const ENV_DB_PATH: &str = "STARCHART_DB_PATH";
pub const ENV_COLLECTION: &str = "STARCHART_COLLECTION";
pub const ENV_DOCUMENT_ID: &str = "STARCHART_DOCUMENT_ID";

pub const DEFAULT_COLLECTION: &str = "starCharts";
pub const DEFAULT_DOCUMENT_ID: &str = "cormacWeeklySchedule";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is unset or blank.
    Missing(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "required setting `{name}` is missing"),
        }
    }
}

impl Error for ConfigError {}

/// Credentials and location of the schedule document.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    pub database_path: PathBuf,
    pub collection: String,
    pub document_id: String,
}

impl StoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, one call per variable name.
    ///
    /// Literal `\n` sequences in the private key become real newlines, since
    /// PEM keys are usually flattened into one line in env files.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &'static str, default: &str| -> String {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            project_id: required(ENV_PROJECT_ID)?,
            client_email: required(ENV_CLIENT_EMAIL)?,
            private_key: required(ENV_PRIVATE_KEY)?.replace("\\n", "\n"),
            database_path: PathBuf::from(required(ENV_DB_PATH)?),
            collection: optional(ENV_COLLECTION, DEFAULT_COLLECTION),
            document_id: optional(ENV_DOCUMENT_ID, DEFAULT_DOCUMENT_ID),
        })
    }

    pub fn document_path(&self) -> DocumentPath {
        DocumentPath::new(
            self.project_id.as_str(),
            self.collection.as_str(),
            self.document_id.as_str(),
        )
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("database_path", &self.database_path)
            .field("collection", &self.collection)
            .field("document_id", &self.document_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| map.get(name).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_PROJECT_ID, "star-chart"),
            (ENV_CLIENT_EMAIL, "writer@star-chart.example"),
            (ENV_PRIVATE_KEY, "-----BEGIN KEY-----\\nabc\\n-----END KEY-----"),
            (ENV_DB_PATH, "/var/lib/starchart/store.sqlite3"),
        ]
    }

    #[test]
    fn reads_required_values_and_defaults() {
        let config = StoreConfig::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(config.project_id, "star-chart");
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.document_id, DEFAULT_DOCUMENT_ID);
        assert_eq!(
            config.private_key,
            "-----BEGIN KEY-----\nabc\n-----END KEY-----"
        );
        assert_eq!(
            config.document_path(),
            DocumentPath::new("star-chart", "starCharts", "cormacWeeklySchedule")
        );
    }

    #[test]
    fn optional_values_override_defaults() {
        let mut env = full_env();
        env.push((ENV_COLLECTION, "charts"));
        env.push((ENV_DOCUMENT_ID, " week-2 "));
        let config = StoreConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.collection, "charts");
        assert_eq!(config.document_id, "week-2");
    }

    #[test]
    fn missing_or_blank_required_value_is_rejected() {
        let env = full_env()
            .into_iter()
            .filter(|(key, _)| *key != ENV_CLIENT_EMAIL)
            .collect::<Vec<_>>();
        assert_eq!(
            StoreConfig::from_lookup(lookup_from(&env)),
            Err(ConfigError::Missing(ENV_CLIENT_EMAIL))
        );

        let mut env = full_env();
        env.retain(|(key, _)| *key != ENV_PROJECT_ID);
        env.push((ENV_PROJECT_ID, "   "));
        assert_eq!(
            StoreConfig::from_lookup(lookup_from(&env)),
            Err(ConfigError::Missing(ENV_PROJECT_ID))
        );
    }

    #[test]
    fn debug_output_redacts_private_key() {
        let config = StoreConfig::from_lookup(lookup_from(&full_env())).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("BEGIN KEY"));
    }
}
