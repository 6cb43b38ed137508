//! Story records as fetched from the source and as served to callers.


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote item identifier.
pub type ItemId = u64;

/// Detail record exactly as the remote source returned it.
///
/// Missing fields default to empty/zero: the upstream omits `url` for text posts
/// and `descendants` for some item kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    /// Item id reported by the source.
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    /// Link target, absent for self posts.
    #[serde(default, rename = "url")]
    pub uri: Option<String>,
    /// Author handle.
    #[serde(default, rename = "by")]
    pub posted_by: String,
    /// Creation instant in seconds since the Unix epoch.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub score: u32,
    /// Comment count.
    #[serde(default, rename = "descendants")]
    pub comment_count: u32,
}

impl RawItem {
    /// Creation instant as a UTC timestamp (epoch for out-of-range values).
    pub fn posted_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.time, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// A [`RawItem`] stamped with local enrichment metadata.
///
/// Built on every access, cached data included, so `created_at` is the time the
/// item was served and `created_on` names the instance that served it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedItem {
    pub id: ItemId,
    pub title: String,
    pub uri: Option<String>,
    pub posted_by: String,
    pub time: DateTime<Utc>,
    pub score: u32,
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
    pub created_on: String,
}

impl EnrichedItem {
    /// Maps a raw record, stamping it with `now` and the `origin` instance name.
    pub fn from_raw(raw: &RawItem, now: DateTime<Utc>, origin: &str) -> Self {
        Self {
            id: raw.id,
            title: raw.title.clone(),
            uri: raw.uri.clone(),
            posted_by: raw.posted_by.clone(),
            time: raw.posted_at(),
            score: raw.score,
            comment_count: raw.comment_count,
            created_at: now,
            created_on: origin.to_string(),
        }
    }
}

/// Whether a result was served from the cached story set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheStatus::Hit)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}

/// Result of a top-N request together with how it was served.
#[derive(Debug, Clone)]
pub struct TopStories {
    pub stories: Vec<EnrichedItem>,
    pub cache_status: CacheStatus,
}
