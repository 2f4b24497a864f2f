use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_COOKIES_PATH, DEFAULT_SEARCH_BASE, DEFAULT_USER_AGENT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Session
    pub cookies_path: PathBuf,
    pub user_agent: String,

    // Endpoints
    pub api_base: String,
    pub search_base: String,

    // Transport
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Session
            cookies_path: PathBuf::from(env_or_default("WEIBO_COOKIES_PATH", DEFAULT_COOKIES_PATH)),
            user_agent: env_or_default("WEIBO_USER_AGENT", DEFAULT_USER_AGENT),

            // Endpoints
            api_base: trim_base(&env_or_default("WEIBO_API_BASE", DEFAULT_API_BASE)),
            search_base: trim_base(&env_or_default("WEIBO_SEARCH_BASE", DEFAULT_SEARCH_BASE)),

            // Transport
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),
        })
    }

    /// Defaults suitable for tests: no cookie file and the public endpoints.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            cookies_path: PathBuf::from(DEFAULT_COOKIES_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, base) in [
            ("WEIBO_API_BASE", &self.api_base),
            ("WEIBO_SEARCH_BASE", &self.search_base),
        ] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("must be an http(s) URL, got '{base}'"),
                });
            }
        }
        if self.user_agent.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "WEIBO_USER_AGENT".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "WEIBO_COOKIES_PATH",
            "WEIBO_USER_AGENT",
            "WEIBO_API_BASE",
            "WEIBO_SEARCH_BASE",
            "REQUEST_TIMEOUT_SECS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.cookies_path, PathBuf::from(DEFAULT_COOKIES_PATH));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.search_base, DEFAULT_SEARCH_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_and_trims_base() {
        clear_env();
        std::env::set_var("WEIBO_API_BASE", "http://127.0.0.1:9000/");
        std::env::set_var("REQUEST_TIMEOUT_SECS", "5");
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_timeout() {
        clear_env();
        std::env::set_var("REQUEST_TIMEOUT_SECS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::ParseInt { .. })
        ));
        clear_env();
    }

    #[test]
    fn test_validate_rejects_non_http_base() {
        let config = Config {
            api_base: "weibo.com".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());

        let config = Config {
            request_timeout: Duration::ZERO,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
