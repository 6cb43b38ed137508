use std::time::Duration;

/// Outbound detail fetches allowed in flight across the whole process.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 10;
/// Lifetime of the cached story set.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
/// Origin tag used when no instance name is configured.
pub const DEFAULT_ORIGIN: &str = "beststories";

#[derive(Debug, Clone)]
/// Plain values consumed by [`super::BestStoriesAggregator`].
pub struct AggregatorConfig {
    /// TTL applied on every cache write.
    pub cache_ttl: Duration,
    /// Instance name stamped on enriched stories.
    pub origin: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl AggregatorConfig {
    pub fn new(cache_ttl: Duration, origin: impl Into<String>) -> Self {
        Self {
            cache_ttl,
            origin: origin.into(),
        }
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}
