//! Application-level configuration loading for the live session engine.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVEQUIZ_BACK_CONFIG_PATH";

/// Time limit applied when a session is created without one.
const DEFAULT_TIME_LIMIT_SECS: u64 = 300;
/// Median response time below which a session counts as a lightning round.
const DEFAULT_FAST_RESPONSE_MS: u64 = 5_000;
/// How often the background ticker visits sessions.
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
/// Broadcast channel capacity for per-session SSE hubs.
const DEFAULT_SSE_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Session time limit used when the create request omits one.
    pub default_time_limit: Duration,
    /// Lightning Round threshold on the median response time.
    pub fast_response_threshold: Duration,
    /// Interval between ticker passes over the session registry.
    pub tick_interval: Duration,
    /// Capacity of each session's SSE broadcast channel.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_time_limit: Duration::from_secs(DEFAULT_TIME_LIMIT_SECS),
            fast_response_threshold: Duration::from_millis(DEFAULT_FAST_RESPONSE_MS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// All keys are optional; missing values use the built-in defaults.
struct RawConfig {
    default_time_limit_secs: Option<u64>,
    fast_response_threshold_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            default_time_limit: raw
                .default_time_limit_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_time_limit),
            fast_response_threshold: raw
                .fast_response_threshold_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.fast_response_threshold),
            tick_interval: raw
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            sse_capacity: raw.sse_capacity.unwrap_or(defaults.sse_capacity),
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
    fn missing_keys_fall_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.default_time_limit, Duration::from_secs(300));
        assert_eq!(config.fast_response_threshold, Duration::from_millis(5_000));
        assert_eq!(config.sse_capacity, DEFAULT_SSE_CAPACITY);
    }

    #[test]
    fn provided_keys_override_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"default_time_limit_secs": 60, "fast_response_threshold_ms": 2000}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.default_time_limit, Duration::from_secs(60));
        assert_eq!(config.fast_response_threshold, Duration::from_millis(2_000));
        assert_eq!(config.tick_interval, Duration::from_millis(1_000));
    }
}
