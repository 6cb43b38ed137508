use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;

use crate::source::{SourceError, SourceResult};

/// Process-wide admission control for outbound detail fetches.
///
/// Clones share the same permits, so every aggregator built from one limiter
/// competes for a single budget.
#[derive(Debug, Clone)]
pub struct FetchLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl FetchLimiter {
    /// Creates a limiter with `capacity` permits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a permit, giving up with [`SourceError::Cancelled`] when `cancel` fires.
    ///
    /// The permit is returned when the guard drops.
    pub async fn acquire(&self, cancel: &CancellationToken) -> SourceResult<SemaphorePermit<'_>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            permit = self.semaphore.acquire() => permit.map_err(|_| SourceError::Cancelled),
        }
    }
}

impl Default for FetchLimiter {
    fn default() -> Self {
        Self::new(super::DEFAULT_FETCH_CONCURRENCY)
    }
}
