use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants::{DEFAULT_FETCH_TIMEOUT, DEFAULT_TTL};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name} base URL '{value}': {source}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{name} base URL '{value}' must use http or https")]
    UnsupportedScheme { name: &'static str, value: String },

    #[error("cache TTL must be greater than zero")]
    ZeroTtl,
}

/// Runtime settings of the edge server. Built once at startup and handed to
/// [`crate::proxy::CacheService`]; nothing reads it from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Base URL of the content origin, without trailing slash.
    pub origin_url: String,
    /// Base URL of the backend API, without trailing slash.
    pub api_url: String,
    pub ttl_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            origin_url: "http://localhost:8080".to_string(),
            api_url: "http://localhost:3000".to_string(),
            ttl_secs: DEFAULT_TTL.as_secs(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
        }
    }
}

impl EdgeConfig {
    pub fn new(
        origin_url: &str,
        api_url: &str,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }

        Ok(Self {
            origin_url: normalize_base_url("origin", origin_url)?,
            api_url: normalize_base_url("api", api_url)?,
            ttl_secs: ttl.as_secs().max(1),
            fetch_timeout_secs: fetch_timeout.as_secs(),
        })
    }

    pub fn from_cli(cli: &crate::cli::ServeCommand) -> Result<Self, ConfigError> {
        Self::new(
            &cli.origin,
            &cli.api,
            Duration::from_secs(cli.ttl_secs),
            Duration::from_secs(cli.fetch_timeout_secs),
        )
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Deadline applied to every upstream call. Zero disables it.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self.fetch_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn normalize_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            name,
            value: value.to_string(),
        });
    }

    Ok(value.trim_end_matches('/').to_string())
}
