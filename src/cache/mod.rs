//! Time-limited in-memory cache for the aggregated story set.

pub mod ttl;


pub use ttl::TtlCache;

use std::sync::Arc;

use crate::model::RawItem;

/// Fixed key of the single aggregated entry. Never derived from request parameters.
pub const BEST_STORIES_CACHE_KEY: &str = "best_stories";

/// Cache holding the raw story set shared by every top-N request.
pub type StoryCache = TtlCache<&'static str, Arc<Vec<RawItem>>>;
