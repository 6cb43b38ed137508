//! Remote item sources: the ranked id list and per-item detail records.

pub mod config;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
/// Scripted in-memory source (enabled with `mock` feature).
pub mod mock;


pub use config::{
    DEFAULT_API_BASE_URL, DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS, HttpSourceConfig,
};
pub use error::{SourceError, SourceResult};
pub use http::HttpItemSource;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockItemSource;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::model::{ItemId, RawItem};

#[async_trait]
/// Read access to the remote item listing.
///
/// Implementations own their transport policy (retries, timeouts, backoff) and
/// report only the final outcome of each call.
pub trait ItemSource: Send + Sync {
    /// Returns the current ranked list of best item ids.
    async fn list_ids(&self, cancel: &CancellationToken) -> SourceResult<Vec<ItemId>>;

    /// Returns the detail record for `id`.
    async fn get_detail(&self, id: ItemId, cancel: &CancellationToken) -> SourceResult<RawItem>;
}
