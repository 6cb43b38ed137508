//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `BESTSTORIES_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use reqwest::Url;

use crate::aggregator::{AggregatorConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_CONCURRENCY};
use crate::source::{
    DEFAULT_API_BASE_URL, DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS, HttpSourceConfig,
};

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `BESTSTORIES_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Hacker News API root. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Max detail fetches in flight across all requests. Default: `10`.
    pub fetch_concurrency: usize,

    /// Lifetime of the cached story set. Default: 10 minutes.
    pub cache_ttl: Duration,

    /// Deadline for one upstream call including retries. Default: 30 s.
    pub request_timeout: Duration,

    /// Deadline for a single HTTP attempt. Default: 10 s.
    pub attempt_timeout: Duration,

    /// Retries after the first failed attempt. Default: `3`.
    pub max_retries: u32,

    /// First retry delay, doubled on each retry. Default: 500 ms.
    pub retry_base_delay: Duration,

    /// Origin tag stamped on served stories.
    pub instance_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            instance_name: generated_instance_name(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "BESTSTORIES_PORT";
    const ENV_BIND_ADDR: &'static str = "BESTSTORIES_BIND_ADDR";
    const ENV_API_BASE_URL: &'static str = "BESTSTORIES_API_BASE_URL";
    const ENV_FETCH_CONCURRENCY: &'static str = "BESTSTORIES_FETCH_CONCURRENCY";
    const ENV_CACHE_TTL_SECS: &'static str = "BESTSTORIES_CACHE_TTL_SECS";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "BESTSTORIES_REQUEST_TIMEOUT_SECS";
    const ENV_ATTEMPT_TIMEOUT_SECS: &'static str = "BESTSTORIES_ATTEMPT_TIMEOUT_SECS";
    const ENV_MAX_RETRIES: &'static str = "BESTSTORIES_MAX_RETRIES";
    const ENV_RETRY_BASE_DELAY_MS: &'static str = "BESTSTORIES_RETRY_BASE_DELAY_MS";
    const ENV_INSTANCE_NAME: &'static str = "BESTSTORIES_INSTANCE_NAME";
    const ENV_HOSTNAME: &'static str = "HOSTNAME";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let api_base_url =
            Self::parse_string_from_env(Self::ENV_API_BASE_URL, defaults.api_base_url);
        let fetch_concurrency = Self::parse_u64_from_env(
            Self::ENV_FETCH_CONCURRENCY,
            defaults.fetch_concurrency as u64,
        ) as usize;
        let cache_ttl = Self::parse_secs_from_env(Self::ENV_CACHE_TTL_SECS, defaults.cache_ttl);
        let request_timeout =
            Self::parse_secs_from_env(Self::ENV_REQUEST_TIMEOUT_SECS, defaults.request_timeout);
        let attempt_timeout =
            Self::parse_secs_from_env(Self::ENV_ATTEMPT_TIMEOUT_SECS, defaults.attempt_timeout);
        let max_retries =
            Self::parse_u64_from_env(Self::ENV_MAX_RETRIES, defaults.max_retries.into())
                .min(u32::MAX.into()) as u32;
        let retry_base_delay = Duration::from_millis(Self::parse_u64_from_env(
            Self::ENV_RETRY_BASE_DELAY_MS,
            defaults.retry_base_delay.as_millis() as u64,
        ));
        let instance_name = Self::parse_optional_string_from_env(Self::ENV_INSTANCE_NAME)
            .or_else(|| Self::parse_optional_string_from_env(Self::ENV_HOSTNAME))
            .unwrap_or(defaults.instance_name);

        Ok(Self {
            port,
            bind_addr,
            api_base_url,
            fetch_concurrency,
            cache_ttl,
            request_timeout,
            attempt_timeout,
            max_retries,
            retry_base_delay,
            instance_name,
        })
    }

    /// Validates basic invariants (does not contact the upstream).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::InvalidFetchConcurrency {
                value: self.fetch_concurrency,
            });
        }

        if self.cache_ttl.is_zero() {
            return Err(ConfigError::InvalidDuration {
                name: Self::ENV_CACHE_TTL_SECS,
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration {
                name: Self::ENV_REQUEST_TIMEOUT_SECS,
            });
        }
        if self.attempt_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration {
                name: Self::ENV_ATTEMPT_TIMEOUT_SECS,
            });
        }

        let url = Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidApiBaseUrl {
            value: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiBaseUrl {
                value: self.api_base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    /// Transport policy for [`crate::source::HttpItemSource`].
    pub fn http_source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig::default()
            .base_url(&self.api_base_url)
            .request_timeout(self.request_timeout)
            .attempt_timeout(self.attempt_timeout)
            .max_retries(self.max_retries)
            .retry_base_delay(self.retry_base_delay)
    }

    /// Values consumed by [`crate::aggregator::BestStoriesAggregator`].
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig::new(self.cache_ttl, self.instance_name.clone())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn parse_secs_from_env(var_name: &str, default: Duration) -> Duration {
        Duration::from_secs(Self::parse_u64_from_env(var_name, default.as_secs()))
    }
}

fn generated_instance_name() -> String {
    format!("beststories-{}", uuid::Uuid::new_v4())
}
