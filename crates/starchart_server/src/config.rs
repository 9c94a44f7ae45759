//! Process-level settings for the schedule server.

use starchart_core::default_log_level;
use std::path::PathBuf;

pub const ENV_BIND: &str = "STARCHART_BIND";
pub const ENV_LOG_DIR: &str = "STARCHART_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "STARCHART_LOG_LEVEL";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Every setting has a default, so this never fails.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_dir = value(ENV_LOG_DIR)
            .map(PathBuf::from)
            .filter(|path| path.is_absolute())
            .unwrap_or_else(default_log_dir);

        Self {
            bind_addr: value(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            log_dir,
            log_level: value(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
        }
    }
}

fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("logs")
}
