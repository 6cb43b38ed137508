use std::time::Duration;

/// Hacker News Firebase API root.
pub const DEFAULT_API_BASE_URL: &str = "https://hacker-news.firebaseio.com/";
/// Upper bound for one call, retries and backoff included.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Upper bound for a single HTTP attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 10;
/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// First backoff delay; doubles on every retry.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
/// Transport policy for [`super::HttpItemSource`].
pub struct HttpSourceConfig {
    /// API root; relative paths like `v0/item/1.json` are joined onto it.
    pub base_url: String,
    pub request_timeout: Duration,
    pub attempt_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl HttpSourceConfig {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Backoff before retry number `attempt` (1-based): `base * 2^(attempt - 1)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.retry_base_delay.saturating_mul(1u32 << exponent)
    }
}
