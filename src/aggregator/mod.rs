//! Best stories aggregation: cache lookup, bounded fan-out, ranking and enrichment.
//!
//! A cache miss fetches the id list, then every detail record with at most
//! [`FetchLimiter::capacity`] calls outstanding. The complete raw set is cached
//! under one fixed key, independent of the requested count. Any failure voids
//! the whole batch and nothing is cached.

pub mod config;
pub mod limiter;

#[cfg(test)]
mod tests;

pub use config::{
    AggregatorConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_CONCURRENCY, DEFAULT_ORIGIN,
};
pub use limiter::FetchLimiter;

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cache::{BEST_STORIES_CACHE_KEY, StoryCache};
use crate::model::{CacheStatus, EnrichedItem, ItemId, RawItem, TopStories};
use crate::source::{ItemSource, SourceError, SourceResult};

/// Serves ranked top-N slices of the best stories feed.
pub struct BestStoriesAggregator<S: ItemSource> {
    source: Arc<S>,
    cache: StoryCache,
    limiter: FetchLimiter,
    config: AggregatorConfig,
}

impl<S: ItemSource> std::fmt::Debug for BestStoriesAggregator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestStoriesAggregator")
            .field("cache", &self.cache)
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: ItemSource> BestStoriesAggregator<S> {
    /// Wires the aggregator to shared process resources.
    ///
    /// `cache` and `limiter` are handles: clones passed to other aggregators
    /// share their entries and permits.
    pub fn new(
        source: Arc<S>,
        cache: StoryCache,
        limiter: FetchLimiter,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            source,
            cache,
            limiter,
            config,
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn cache(&self) -> &StoryCache {
        &self.cache
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Returns up to `count` stories, highest score first.
    pub async fn top_n(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> SourceResult<Vec<EnrichedItem>> {
        self.top_n_with_status(count, cancel)
            .await
            .map(|top| top.stories)
    }

    /// Like [`Self::top_n`], also reporting whether the cached set was used.
    #[instrument(skip(self, cancel))]
    pub async fn top_n_with_status(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> SourceResult<TopStories> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }

        let (items, cache_status) = match self.cache.get(&BEST_STORIES_CACHE_KEY) {
            Some(items) => {
                info!(cached = items.len(), "Best stories cache hit");
                (items, CacheStatus::Hit)
            }
            None => {
                info!("Best stories cache miss");
                match self.refresh(cancel).await? {
                    Some(items) => (items, CacheStatus::Miss),
                    None => {
                        return Ok(TopStories {
                            stories: Vec::new(),
                            cache_status: CacheStatus::Miss,
                        });
                    }
                }
            }
        };

        let now = Utc::now();
        let stories = rank(&items, count)
            .into_iter()
            .map(|raw| EnrichedItem::from_raw(raw, now, &self.config.origin))
            .collect();

        Ok(TopStories {
            stories,
            cache_status,
        })
    }

    /// Fetches and caches a fresh raw set. `None` when the source lists no ids.
    async fn refresh(
        &self,
        cancel: &CancellationToken,
    ) -> SourceResult<Option<Arc<Vec<RawItem>>>> {
        let ids = until_cancelled(cancel, self.source.list_ids(cancel)).await?;
        if ids.is_empty() {
            warn!("Source returned no best story ids");
            return Ok(None);
        }

        let items = Arc::new(self.fetch_details(&ids, cancel).await?);

        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        self.cache.set(
            BEST_STORIES_CACHE_KEY,
            Arc::clone(&items),
            self.config.cache_ttl,
        );
        info!(
            stories = items.len(),
            ttl_secs = self.config.cache_ttl.as_secs(),
            "Cached best stories"
        );

        Ok(Some(items))
    }

    async fn fetch_details(
        &self,
        ids: &[ItemId],
        cancel: &CancellationToken,
    ) -> SourceResult<Vec<RawItem>> {
        debug!(
            ids = ids.len(),
            concurrency = self.limiter.capacity(),
            "Fetching story details"
        );

        let mut pending = FuturesUnordered::new();
        for &id in ids {
            pending.push(self.fetch_detail(id, cancel));
        }

        let mut items = Vec::with_capacity(ids.len());
        while let Some(result) = pending.next().await {
            match result {
                Ok(item) => items.push(item),
                Err(e) => {
                    if !e.is_cancelled() {
                        warn!(
                            error = %e,
                            abandoned = pending.len(),
                            "Story detail fetch failed, discarding batch"
                        );
                    }
                    // Dropping `pending` releases every permit still held.
                    return Err(e);
                }
            }
        }

        Ok(items)
    }

    async fn fetch_detail(&self, id: ItemId, cancel: &CancellationToken) -> SourceResult<RawItem> {
        let _permit = self.limiter.acquire(cancel).await?;
        until_cancelled(cancel, self.source.get_detail(id, cancel)).await
    }
}

/// Runs `fut` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = SourceResult<T>>,
) -> SourceResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SourceError::Cancelled),
        result = fut => result,
    }
}

/// Highest score first, ties by ascending id, cut to `count`.
fn rank(items: &[RawItem], count: usize) -> Vec<&RawItem> {
    let mut ranked: Vec<&RawItem> = items.iter().collect();
    ranked.sort_unstable_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    ranked.truncate(count);
    ranked
}
