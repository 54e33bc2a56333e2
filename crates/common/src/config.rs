//! Call session configuration.
//!
//! Configuration is loaded from environment variables with defaults for
//! every field. Unparsable values are rejected rather than silently replaced.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default capacity of the session actor mailbox.
pub const DEFAULT_SESSION_CHANNEL_BUFFER: usize = 256;

/// Default capacity of the engine update channel.
pub const DEFAULT_ENGINE_EVENT_BUFFER: usize = 512;

/// Default timeout for a roster page fetch, in milliseconds.
pub const DEFAULT_MEMBERS_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Default number of participants shown in a call summary.
pub const DEFAULT_SUMMARY_TOP_PARTICIPANTS: usize = 3;

/// Default tracing filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub log_level: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

/// Call session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Session actor mailbox capacity.
    pub session_channel_buffer: usize,

    /// Engine update channel capacity.
    pub engine_event_buffer: usize,

    /// Upper bound on a single roster page fetch.
    pub members_fetch_timeout: Duration,

    /// How many participants a call summary carries.
    pub summary_top_participants: usize,

    /// Logging setup.
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_channel_buffer: DEFAULT_SESSION_CHANNEL_BUFFER,
            engine_event_buffer: DEFAULT_ENGINE_EVENT_BUFFER,
            members_fetch_timeout: Duration::from_millis(DEFAULT_MEMBERS_FETCH_TIMEOUT_MS),
            summary_top_participants: DEFAULT_SUMMARY_TOP_PARTICIPANTS,
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed,
    /// or if a channel capacity is zero.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let session_channel_buffer = parse_var(
            vars,
            "CALL_SESSION_CHANNEL_BUFFER",
            DEFAULT_SESSION_CHANNEL_BUFFER,
        )?;
        let engine_event_buffer =
            parse_var(vars, "CALL_ENGINE_EVENT_BUFFER", DEFAULT_ENGINE_EVENT_BUFFER)?;

        // tokio::sync::mpsc::channel panics on a zero capacity
        if session_channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "CALL_SESSION_CHANNEL_BUFFER must be greater than zero".to_string(),
            ));
        }
        if engine_event_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "CALL_ENGINE_EVENT_BUFFER must be greater than zero".to_string(),
            ));
        }

        let members_fetch_timeout_ms = parse_var(
            vars,
            "CALL_MEMBERS_FETCH_TIMEOUT_MS",
            DEFAULT_MEMBERS_FETCH_TIMEOUT_MS,
        )?;

        let summary_top_participants = parse_var(
            vars,
            "CALL_SUMMARY_TOP_PARTICIPANTS",
            DEFAULT_SUMMARY_TOP_PARTICIPANTS,
        )?;

        let log_level = vars
            .get("CALL_LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let json_logs = parse_var(vars, "CALL_JSON_LOGS", false)?;

        Ok(Config {
            session_channel_buffer,
            engine_event_buffer,
            members_fetch_timeout: Duration::from_millis(members_fetch_timeout_ms),
            summary_top_participants,
            observability: ObservabilityConfig {
                log_level,
                json_logs,
            },
        })
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{name}={raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config =
            Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(config, Config::default());
        assert_eq!(config.session_channel_buffer, DEFAULT_SESSION_CHANNEL_BUFFER);
        assert_eq!(config.engine_event_buffer, DEFAULT_ENGINE_EVENT_BUFFER);
        assert_eq!(config.members_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.summary_top_participants, 3);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.json_logs);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("CALL_SESSION_CHANNEL_BUFFER".to_string(), "64".to_string()),
            ("CALL_ENGINE_EVENT_BUFFER".to_string(), "128".to_string()),
            ("CALL_MEMBERS_FETCH_TIMEOUT_MS".to_string(), "2500".to_string()),
            ("CALL_SUMMARY_TOP_PARTICIPANTS".to_string(), "5".to_string()),
            ("CALL_LOG_LEVEL".to_string(), "debug".to_string()),
            ("CALL_JSON_LOGS".to_string(), "true".to_string()),
        ]);

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.session_channel_buffer, 64);
        assert_eq!(config.engine_event_buffer, 128);
        assert_eq!(config.members_fetch_timeout, Duration::from_millis(2500));
        assert_eq!(config.summary_top_participants, 5);
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_from_vars_rejects_unparsable_number() {
        let vars = HashMap::from([(
            "CALL_MEMBERS_FETCH_TIMEOUT_MS".to_string(),
            "soon".to_string(),
        )]);

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("CALL_MEMBERS_FETCH_TIMEOUT_MS"));
    }

    #[test]
    fn test_from_vars_rejects_unparsable_bool() {
        let vars = HashMap::from([("CALL_JSON_LOGS".to_string(), "yes".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_from_vars_rejects_zero_buffers() {
        let vars = HashMap::from([("CALL_SESSION_CHANNEL_BUFFER".to_string(), "0".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));

        let vars = HashMap::from([("CALL_ENGINE_EVENT_BUFFER".to_string(), "0".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
