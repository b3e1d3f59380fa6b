//! Storage trait definitions for the catalog and the interaction signals.

use super::models::{DiscoveryStats, ListenClick, Mention, MentionState, MusicItem, Rating};
use anyhow::Result;

/// Trait for the music catalog backend. A simple keyed store; the
/// interaction queries consume it as a read dependency.
pub trait CatalogStore: Send + Sync {
    /// Adds a music item to the catalog.
    /// Fails with `StoreError::MusicConflict` if (title, artist) already exists.
    fn create_music(
        &self,
        title: &str,
        album: &str,
        artist: &str,
        listen_link: &str,
    ) -> Result<MusicItem>;

    /// Looks up a music item by its (title, artist) natural key.
    fn find_by_title_and_artist(&self, title: &str, artist: &str) -> Result<Option<MusicItem>>;

    /// Looks up a music item by title.
    fn get_by_title(&self, title: &str) -> Result<Option<MusicItem>>;

    /// Looks up a music item by id.
    fn get_music(&self, music_id: i64) -> Result<Option<MusicItem>>;

    /// Returns the full catalog, in catalog iteration order.
    fn get_all_music(&self) -> Result<Vec<MusicItem>>;

    /// Returns summary row counts for the discovery database.
    fn get_stats(&self) -> Result<DiscoveryStats>;
}

/// Trait for the interaction signal backend: the write path (tracker) and
/// the read path (filtering and aggregation).
pub trait InteractionStore: Send + Sync {
    // =========================================================================
    // Write path
    // =========================================================================

    /// Upserts the mention row for (user, music): inserts if absent,
    /// overwrites `heard_before` if present. Idempotent; repeated calls with
    /// the same value produce no observable change. Returns the resulting row.
    fn record_mention(&self, user_id: i64, music_id: i64, heard_before: bool) -> Result<Mention>;

    /// Inserts a new listen click row. Never merges with existing clicks.
    fn record_listen_click(&self, user_id: i64, music_id: i64) -> Result<ListenClick>;

    /// Deletes all listen click rows for a user and returns the deleted
    /// count. Zero rows is not an error. Mentions and ratings are untouched,
    /// they have separate lifecycles.
    fn purge_listen_clicks(&self, user_id: i64) -> Result<usize>;

    /// Inserts a new rating row. Fails with `StoreError::RatingConflict` if
    /// the (user, music) pair already has one; editing is a distinct operation.
    fn create_rating(&self, user_id: i64, music_id: i64, rating: i64) -> Result<Rating>;

    /// Upserts the rating for (user, music): inserts if absent, else
    /// overwrites the value in place. Never conflicts.
    fn edit_rating(&self, user_id: i64, music_id: i64, rating: i64) -> Result<()>;

    // =========================================================================
    // Read path
    // =========================================================================

    /// Returns the stored mention signal for (user, music). `Unset` means no
    /// row exists, which is a different state than `NotHeardBefore`.
    fn check_mention(&self, user_id: i64, music_id: i64) -> Result<MentionState>;

    /// Returns all mention rows for a user.
    fn get_mentions_for_user(&self, user_id: i64) -> Result<Vec<Mention>>;

    /// Returns the user's rating for a music item, if any.
    fn get_rating(&self, user_id: i64, music_id: i64) -> Result<Option<Rating>>;

    /// Returns all rating rows for a music item.
    fn get_ratings_for_music(&self, music_id: i64) -> Result<Vec<Rating>>;

    /// Catalog items with no mention row for this user. Items explicitly
    /// marked as not heard before do NOT appear here.
    fn get_not_mentioned_music(&self, user_id: i64) -> Result<Vec<MusicItem>>;

    /// Catalog items this user explicitly marked as not heard before.
    /// Items the user never mentioned do NOT appear here.
    fn get_not_heard_before_music(&self, user_id: i64) -> Result<Vec<MusicItem>>;

    /// Count of distinct users who marked the item as not heard before.
    fn get_not_heard_before_count(&self, music_id: i64) -> Result<usize>;

    /// Count of distinct users with a mention row (any value) but no rating
    /// row for the item.
    fn get_heard_not_rated_count(&self, music_id: i64) -> Result<usize>;

    /// Catalog items with no rating row for this user.
    fn get_not_rated_music(&self, user_id: i64) -> Result<Vec<MusicItem>>;

    /// Number of distinct users who rated the item. Invariant under repeated
    /// edits by the same user.
    fn get_rating_count_for_music(&self, music_id: i64) -> Result<usize>;

    /// Sum of all ratings for the item; 0 when no ratings exist, never null.
    fn get_sum_total_rating_for_music(&self, music_id: i64) -> Result<i64>;
}
