//! Best stories library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`BestStoriesAggregator`] - Cached, bounded-concurrency top-N aggregation
//! - [`FetchLimiter`] - Process-wide admission control for detail fetches
//! - [`TtlCache`], [`StoryCache`] - Per-entry TTL cache and the story set alias
//! - [`RawItem`], [`EnrichedItem`], [`TopStories`] - Story records
//!
//! ## Remote Source
//! - [`ItemSource`] - Id list and detail lookups
//! - [`HttpItemSource`], [`HttpSourceConfig`] - Hacker News Firebase API client
//! - [`SourceError`] - Transport, not-found and cancellation failures
//!
//! ## Configuration
//! - [`Config`], [`ConfigError`] - `BESTSTORIES_*` environment configuration
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod model;
pub mod source;

pub use aggregator::{
    AggregatorConfig, BestStoriesAggregator, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_CONCURRENCY,
    FetchLimiter,
};
pub use cache::{BEST_STORIES_CACHE_KEY, StoryCache, TtlCache};
pub use config::{Config, ConfigError};
pub use model::{CacheStatus, EnrichedItem, ItemId, RawItem, TopStories};
#[cfg(any(test, feature = "mock"))]
pub use source::MockItemSource;
pub use source::{HttpItemSource, HttpSourceConfig, ItemSource, SourceError, SourceResult};

/// Response header carrying the cache status or error code of a request.
pub const BEST_STORIES_STATUS_HEADER: &str = "x-best-stories-status";
/// Header value for a healthy service.
pub const BEST_STORIES_STATUS_HEALTHY: &str = "healthy";
