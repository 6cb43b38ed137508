use thiserror::Error;

use crate::model::ItemId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors returned by item sources, surfaced unchanged by the aggregator.
pub enum SourceError {
    /// The remote call failed after the transport policy gave up.
    #[error("request to '{url}' failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The source has no record for the item.
    #[error("item {id} not found")]
    NotFound {
        /// Requested item.
        id: ItemId,
    },

    /// The operation was aborted through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

impl SourceError {
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}

/// Convenience result type for source and aggregator operations.
pub type SourceResult<T> = Result<T, SourceError>;
