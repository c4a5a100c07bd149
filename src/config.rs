//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLANK_BACK_CONFIG_PATH";

const DEFAULT_SESSION_TTL_MINUTES: u64 = 30 * 24 * 60;
const DEFAULT_RECENT_ATTEMPTS: usize = 3;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// How long an issued session token stays valid.
    pub session_ttl: Duration,
    /// Whether the session cookie carries the `Secure` attribute.
    pub secure_cookies: bool,
    /// Number of attempts shown on the dashboard.
    pub recent_attempts: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        session_ttl_secs = config.session_ttl.as_secs(),
                        secure_cookies = config.secure_cookies,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    session_ttl_minutes: u64,
    secure_cookies: bool,
    recent_attempts: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            secure_cookies: false,
            recent_attempts: DEFAULT_RECENT_ATTEMPTS,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            session_ttl: Duration::from_secs(value.session_ttl_minutes.saturating_mul(60)),
            secure_cookies: value.secure_cookies,
            recent_attempts: value.recent_attempts,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_thirty_days() {
        let config = AppConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(30 * 24 * 3600));
        assert!(!config.secure_cookies);
        assert_eq!(config.recent_attempts, 3);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_json(r#"{ "secure_cookies": true }"#).unwrap();
        assert!(config.secure_cookies);
        assert_eq!(config.recent_attempts, 3);
    }

    #[test]
    fn ttl_is_read_in_minutes() {
        let config = AppConfig::from_json(r#"{ "session_ttl_minutes": 90 }"#).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(5400));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppConfig::from_json("{ not json").is_err());
    }
}
