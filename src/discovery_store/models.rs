//! Data models for the discovery database.

use serde::{Deserialize, Serialize};

/// A catalog item under discovery tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicItem {
    pub id: i64,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub listen_link: String,
}

/// Per-(user, music) record of whether the user had heard of the item
/// before encountering it on the site. `heard_before = false` is a real
/// fact ("explicitly marked as not heard before"), not the absence of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub user_id: i64,
    pub music_id: i64,
    pub heard_before: bool,
    pub created: i64,
}

/// Three-valued mention signal. "No record" and "marked as not heard
/// before" are distinct states and must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionState {
    Unset,
    HeardBefore,
    NotHeardBefore,
}

/// One live rating per (user, music); edits replace the value in place.
/// The value range is not enforced at this layer, callers validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: i64,
    pub music_id: i64,
    pub rating: i64,
    pub created: i64,
}

/// Append-only click event; repeated clicks by the same user on the same
/// item are all retained (used as a click-count metric).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenClick {
    pub id: i64,
    pub user_id: i64,
    pub music_id: i64,
    pub clicked_at: i64,
}

/// Summary row counts for the discovery database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub music_count: usize,
    pub mention_count: usize,
    pub rating_count: usize,
    pub listen_click_count: usize,
}
