use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::error::{SourceError, SourceResult};
use super::ItemSource;
use crate::model::{ItemId, RawItem};

/// Scripted [`ItemSource`] that records how it was called.
///
/// Unknown ids answer [`SourceError::NotFound`]. Concurrency is tracked per
/// outstanding `get_detail` call, including calls dropped mid-flight.
#[derive(Default)]
pub struct MockItemSource {
    ids: Mutex<Vec<ItemId>>,
    items: Mutex<HashMap<ItemId, RawItem>>,
    list_failure: Mutex<Option<SourceError>>,
    detail_failures: Mutex<HashMap<ItemId, SourceError>>,
    delay: Duration,
    item_delays: HashMap<ItemId, Duration>,
    ignore_cancellation: bool,
    list_calls: AtomicUsize,
    detail_calls: Mutex<HashMap<ItemId, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockItemSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `stories` in the given order from `list_ids`.
    pub fn with_stories(self, stories: Vec<RawItem>) -> Self {
        self.set_stories(stories);
        self
    }

    /// Overrides the id list without registering details.
    pub fn with_ids(self, ids: Vec<ItemId>) -> Self {
        *self.ids.lock() = ids;
        self
    }

    /// Delays every call by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delays `get_detail(id)` by `delay` instead of the common delay.
    pub fn with_item_delay(mut self, id: ItemId, delay: Duration) -> Self {
        self.item_delays.insert(id, delay);
        self
    }

    pub fn with_list_failure(self, error: SourceError) -> Self {
        *self.list_failure.lock() = Some(error);
        self
    }

    pub fn with_detail_failure(self, id: ItemId, error: SourceError) -> Self {
        self.detail_failures.lock().insert(id, error);
        self
    }

    /// Keeps sleeping through cancellation, like a source with no cancellation support.
    pub fn ignoring_cancellation(mut self) -> Self {
        self.ignore_cancellation = true;
        self
    }

    /// Replaces the served stories.
    pub fn set_stories(&self, stories: Vec<RawItem>) {
        *self.ids.lock() = stories.iter().map(|s| s.id).collect();
        *self.items.lock() = stories.into_iter().map(|s| (s.id, s)).collect();
    }

    /// Removes every scripted failure.
    pub fn clear_failures(&self) {
        *self.list_failure.lock() = None;
        self.detail_failures.lock().clear();
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Total `get_detail` calls across all ids.
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.lock().values().sum()
    }

    pub fn detail_calls_for(&self, id: ItemId) -> usize {
        self.detail_calls.lock().get(&id).copied().unwrap_or(0)
    }

    /// Highest number of `get_detail` calls observed outstanding at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> SourceResult<()> {
        if delay.is_zero() {
            return Ok(());
        }
        if self.ignore_cancellation {
            tokio::time::sleep(delay).await;
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemSource for MockItemSource {
    async fn list_ids(&self, cancel: &CancellationToken) -> SourceResult<Vec<ItemId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.delay, cancel).await?;

        if let Some(err) = self.list_failure.lock().clone() {
            return Err(err);
        }
        Ok(self.ids.lock().clone())
    }

    async fn get_detail(&self, id: ItemId, cancel: &CancellationToken) -> SourceResult<RawItem> {
        *self.detail_calls.lock().entry(id).or_default() += 1;
        let _guard = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);

        let delay = self.item_delays.get(&id).copied().unwrap_or(self.delay);
        self.pause(delay, cancel).await?;

        if let Some(err) = self.detail_failures.lock().get(&id).cloned() {
            return Err(err);
        }
        self.items
            .lock()
            .get(&id)
            .cloned()
            .ok_or(SourceError::NotFound { id })
    }
}

impl std::fmt::Debug for MockItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockItemSource")
            .field("ids", &self.ids.lock().len())
            .field("list_calls", &self.list_calls())
            .field("detail_calls", &self.detail_calls())
            .finish()
    }
}
