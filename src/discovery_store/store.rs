//! SQLite-backed discovery store implementation.

use super::error::StoreError;
use super::models::{DiscoveryStats, ListenClick, Mention, MentionState, MusicItem, Rating};
use super::schema::DISCOVERY_VERSIONED_SCHEMAS;
use super::trait_def::{CatalogStore, InteractionStore};
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed discovery store. One database holds the catalog and all
/// three signal tables so the filtering queries can join across them.
/// Writes go through a single mutex-guarded connection, reads through a
/// separate read-only connection.
#[derive(Clone)]
pub struct SqliteDiscoveryStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

impl SqliteDiscoveryStore {
    /// Create a new SqliteDiscoveryStore, creating or migrating the database
    /// file as needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open discovery database")?;

        migrate_if_needed(&mut write_conn, DISCOVERY_VERSIONED_SCHEMAS)?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on discovery write connection")?;
        // Foreign key enforcement is per connection.
        write_conn
            .pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys on discovery write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open discovery database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on discovery read connection")?;

        let stats = Self::count_rows(&read_conn)?;
        info!(
            "Discovery store ready: {} music items, {} mentions, {} ratings, {} listen clicks",
            stats.music_count, stats.mention_count, stats.rating_count, stats.listen_click_count
        );

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }

    fn count_rows(conn: &Connection) -> Result<DiscoveryStats> {
        let music_count: usize = conn.query_row("SELECT COUNT(*) FROM music", [], |r| r.get(0))?;
        let mention_count: usize =
            conn.query_row("SELECT COUNT(*) FROM mentions", [], |r| r.get(0))?;
        let rating_count: usize =
            conn.query_row("SELECT COUNT(*) FROM ratings", [], |r| r.get(0))?;
        let listen_click_count: usize =
            conn.query_row("SELECT COUNT(*) FROM listen_clicks", [], |r| r.get(0))?;
        Ok(DiscoveryStats {
            music_count,
            mention_count,
            rating_count,
            listen_click_count,
        })
    }
}

const MUSIC_COLUMNS: &str = "music.id, music.title, music.album, music.artist, music.listen_link";

fn music_from_row(row: &rusqlite::Row) -> rusqlite::Result<MusicItem> {
    Ok(MusicItem {
        id: row.get(0)?,
        title: row.get(1)?,
        album: row.get(2)?,
        artist: row.get(3)?,
        listen_link: row.get(4)?,
    })
}

fn mention_from_row(row: &rusqlite::Row) -> rusqlite::Result<Mention> {
    Ok(Mention {
        user_id: row.get(0)?,
        music_id: row.get(1)?,
        heard_before: row.get(2)?,
        created: row.get(3)?,
    })
}

fn rating_from_row(row: &rusqlite::Row) -> rusqlite::Result<Rating> {
    Ok(Rating {
        user_id: row.get(0)?,
        music_id: row.get(1)?,
        rating: row.get(2)?,
        created: row.get(3)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _)
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _)
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

/// A foreign key hit on a signal write means the referenced music row is
/// missing; everything else passes through as a storage failure.
fn map_music_fk(err: rusqlite::Error, music_id: i64) -> anyhow::Error {
    if is_foreign_key_violation(&err) {
        anyhow::Error::from(StoreError::NotFound {
            what: "music",
            id: music_id,
        })
    } else {
        anyhow::Error::from(err)
    }
}

impl CatalogStore for SqliteDiscoveryStore {
    fn create_music(
        &self,
        title: &str,
        album: &str,
        artist: &str,
        listen_link: &str,
    ) -> Result<MusicItem> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO music (title, album, artist, listen_link) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, title, album, artist, listen_link",
        )?;
        stmt.query_row(params![title, album, artist, listen_link], music_from_row)
            .map_err(|err| {
                if is_unique_violation(&err) {
                    anyhow::Error::from(StoreError::MusicConflict {
                        title: title.to_string(),
                        artist: artist.to_string(),
                    })
                } else {
                    anyhow::Error::from(err)
                }
            })
            .with_context(|| format!("Failed to create music '{}' by '{}'", title, artist))
    }

    fn find_by_title_and_artist(&self, title: &str, artist: &str) -> Result<Option<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM music WHERE title = ?1 AND artist = ?2",
            MUSIC_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![title, artist], music_from_row)
            .optional()?)
    }

    fn get_by_title(&self, title: &str) -> Result<Option<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM music WHERE title = ?1",
            MUSIC_COLUMNS
        ))?;
        Ok(stmt.query_row(params![title], music_from_row).optional()?)
    }

    fn get_music(&self, music_id: i64) -> Result<Option<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM music WHERE id = ?1",
            MUSIC_COLUMNS
        ))?;
        Ok(stmt.query_row(params![music_id], music_from_row).optional()?)
    }

    fn get_all_music(&self) -> Result<Vec<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!("SELECT {} FROM music", MUSIC_COLUMNS))?;
        let rows = stmt.query_map([], music_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_stats(&self) -> Result<DiscoveryStats> {
        let conn = self.read_conn.lock().unwrap();
        Self::count_rows(&conn)
    }
}

impl InteractionStore for SqliteDiscoveryStore {
    fn record_mention(&self, user_id: i64, music_id: i64, heard_before: bool) -> Result<Mention> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO mentions (user_id, music_id, mentioned) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, music_id) DO UPDATE SET mentioned = excluded.mentioned
             RETURNING user_id, music_id, mentioned, created",
        )?;
        stmt.query_row(params![user_id, music_id, heard_before], mention_from_row)
            .map_err(|err| map_music_fk(err, music_id))
            .with_context(|| format!("Failed to record mention ({}, {})", user_id, music_id))
    }

    fn record_listen_click(&self, user_id: i64, music_id: i64) -> Result<ListenClick> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO listen_clicks (user_id, music_id) VALUES (?1, ?2)
             RETURNING id, user_id, music_id, created",
        )?;
        stmt.query_row(params![user_id, music_id], |row| {
            Ok(ListenClick {
                id: row.get(0)?,
                user_id: row.get(1)?,
                music_id: row.get(2)?,
                clicked_at: row.get(3)?,
            })
        })
        .map_err(|err| map_music_fk(err, music_id))
        .with_context(|| format!("Failed to record listen click ({}, {})", user_id, music_id))
    }

    fn purge_listen_clicks(&self, user_id: i64) -> Result<usize> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn
            .execute(
                "DELETE FROM listen_clicks WHERE user_id = ?1",
                params![user_id],
            )
            .with_context(|| format!("Failed to purge listen clicks for user {}", user_id))?;
        Ok(deleted)
    }

    fn create_rating(&self, user_id: i64, music_id: i64, rating: i64) -> Result<Rating> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO ratings (user_id, music_id, rating) VALUES (?1, ?2, ?3)
             RETURNING user_id, music_id, rating, created",
        )?;
        stmt.query_row(params![user_id, music_id, rating], rating_from_row)
            .map_err(|err| {
                if is_unique_violation(&err) {
                    anyhow::Error::from(StoreError::RatingConflict { user_id, music_id })
                } else {
                    map_music_fk(err, music_id)
                }
            })
            .with_context(|| format!("Failed to create rating ({}, {})", user_id, music_id))
    }

    fn edit_rating(&self, user_id: i64, music_id: i64, rating: i64) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO ratings (user_id, music_id, rating) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, music_id) DO UPDATE SET rating = excluded.rating",
            params![user_id, music_id, rating],
        )
        .map_err(|err| map_music_fk(err, music_id))
        .with_context(|| format!("Failed to edit rating ({}, {})", user_id, music_id))?;
        Ok(())
    }

    fn check_mention(&self, user_id: i64, music_id: i64) -> Result<MentionState> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT mentioned FROM mentions WHERE user_id = ?1 AND music_id = ?2",
        )?;
        let stored: Option<bool> = stmt
            .query_row(params![user_id, music_id], |row| row.get(0))
            .optional()?;
        Ok(match stored {
            None => MentionState::Unset,
            Some(true) => MentionState::HeardBefore,
            Some(false) => MentionState::NotHeardBefore,
        })
    }

    fn get_mentions_for_user(&self, user_id: i64) -> Result<Vec<Mention>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, music_id, mentioned, created FROM mentions WHERE user_id = ?1",
        )?;
        let rows = stmt.query_map(params![user_id], mention_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_rating(&self, user_id: i64, music_id: i64) -> Result<Option<Rating>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, music_id, rating, created FROM ratings
             WHERE user_id = ?1 AND music_id = ?2",
        )?;
        Ok(stmt
            .query_row(params![user_id, music_id], rating_from_row)
            .optional()?)
    }

    fn get_ratings_for_music(&self, music_id: i64) -> Result<Vec<Rating>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, music_id, rating, created FROM ratings WHERE music_id = ?1",
        )?;
        let rows = stmt.query_map(params![music_id], rating_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_not_mentioned_music(&self, user_id: i64) -> Result<Vec<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        // Absence of the mention row is the signal; a row with mentioned = 0
        // means the user DID interact and must not show up here.
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM music
             LEFT JOIN mentions ON mentions.music_id = music.id AND mentions.user_id = ?1
             WHERE mentions.user_id IS NULL",
            MUSIC_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], music_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_not_heard_before_music(&self, user_id: i64) -> Result<Vec<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM music
             JOIN mentions ON mentions.music_id = music.id AND mentions.user_id = ?1
             WHERE mentions.mentioned = 0",
            MUSIC_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], music_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_not_heard_before_count(&self, music_id: i64) -> Result<usize> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT COUNT(DISTINCT user_id) FROM mentions
             WHERE music_id = ?1 AND mentioned = 0",
        )?;
        Ok(stmt.query_row(params![music_id], |row| row.get(0))?)
    }

    fn get_heard_not_rated_count(&self, music_id: i64) -> Result<usize> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT COUNT(DISTINCT m.user_id) FROM mentions m
             LEFT JOIN ratings r ON r.user_id = m.user_id AND r.music_id = m.music_id
             WHERE m.music_id = ?1 AND r.rating IS NULL",
        )?;
        Ok(stmt.query_row(params![music_id], |row| row.get(0))?)
    }

    fn get_not_rated_music(&self, user_id: i64) -> Result<Vec<MusicItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM music
             LEFT JOIN ratings ON ratings.music_id = music.id AND ratings.user_id = ?1
             WHERE ratings.user_id IS NULL",
            MUSIC_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], music_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_rating_count_for_music(&self, music_id: i64) -> Result<usize> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached("SELECT COUNT(*) FROM ratings WHERE music_id = ?1")?;
        Ok(stmt.query_row(params![music_id], |row| row.get(0))?)
    }

    fn get_sum_total_rating_for_music(&self, music_id: i64) -> Result<i64> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached("SELECT COALESCE(SUM(rating), 0) FROM ratings WHERE music_id = ?1")?;
        Ok(stmt.query_row(params![music_id], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteDiscoveryStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("discovery.db");
        let store = SqliteDiscoveryStore::new(&db_path).unwrap();
        (store, tmp)
    }

    fn add_music(store: &SqliteDiscoveryStore, title: &str, artist: &str) -> MusicItem {
        store
            .create_music(title, "Some Album", artist, "https://listen.example/track")
            .unwrap()
    }

    #[test]
    fn test_create_and_lookup_music() {
        let (store, _tmp) = create_test_store();

        let item = add_music(&store, "Windowpane", "Opeth");
        assert!(item.id > 0);

        let found = store
            .find_by_title_and_artist("Windowpane", "Opeth")
            .unwrap()
            .unwrap();
        assert_eq!(found, item);

        let by_title = store.get_by_title("Windowpane").unwrap().unwrap();
        assert_eq!(by_title, item);

        let by_id = store.get_music(item.id).unwrap().unwrap();
        assert_eq!(by_id, item);

        assert!(store
            .find_by_title_and_artist("Windowpane", "Nobody")
            .unwrap()
            .is_none());
        assert!(store.get_by_title("Nothing").unwrap().is_none());
        assert!(store.get_music(item.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_create_music_conflicts_on_duplicate_key() {
        let (store, _tmp) = create_test_store();

        add_music(&store, "Windowpane", "Opeth");
        let duplicate = store.create_music("Windowpane", "Another Album", "Opeth", "link");
        let err = duplicate.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::MusicConflict { .. })
        ));

        // Same title by a different artist is fine.
        add_music(&store, "Windowpane", "Someone Else");
    }

    #[test]
    fn test_record_mention_is_idempotent() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Lateralus", "Tool");

        let first = store.record_mention(42, item.id, false).unwrap();
        let second = store.record_mention(42, item.id, false).unwrap();
        assert_eq!(first, second);

        assert_eq!(
            store.check_mention(42, item.id).unwrap(),
            MentionState::NotHeardBefore
        );
        assert_eq!(store.get_mentions_for_user(42).unwrap().len(), 1);
    }

    #[test]
    fn test_record_mention_overwrites_value() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Lateralus", "Tool");

        store.record_mention(42, item.id, false).unwrap();
        let updated = store.record_mention(42, item.id, true).unwrap();
        assert!(updated.heard_before);

        assert_eq!(
            store.check_mention(42, item.id).unwrap(),
            MentionState::HeardBefore
        );
        // Still exactly one row for the pair.
        assert_eq!(store.get_mentions_for_user(42).unwrap().len(), 1);
    }

    #[test]
    fn test_check_mention_distinguishes_no_record_from_false() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Deadwing", "Porcupine Tree");

        assert_eq!(
            store.check_mention(42, item.id).unwrap(),
            MentionState::Unset
        );

        store.record_mention(42, item.id, false).unwrap();
        assert_eq!(
            store.check_mention(42, item.id).unwrap(),
            MentionState::NotHeardBefore
        );
    }

    #[test]
    fn test_mention_on_missing_music_is_not_found() {
        let (store, _tmp) = create_test_store();

        let err = store.record_mention(42, 999, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_not_mentioned_vs_not_heard_before() {
        let (store, _tmp) = create_test_store();
        let i1 = add_music(&store, "Song One", "Artist One");
        let i2 = add_music(&store, "Song Two", "Artist Two");

        // Before any mention both items are "not mentioned" and neither is
        // "not heard before".
        let not_mentioned = store.get_not_mentioned_music(42).unwrap();
        assert_eq!(not_mentioned.len(), 2);
        assert!(store.get_not_heard_before_music(42).unwrap().is_empty());

        store.record_mention(42, i1.id, false).unwrap();

        let not_mentioned = store.get_not_mentioned_music(42).unwrap();
        assert_eq!(not_mentioned, vec![i2.clone()]);

        let not_heard_before = store.get_not_heard_before_music(42).unwrap();
        assert_eq!(not_heard_before, vec![i1.clone()]);

        // A heard-before mention leaves both listings.
        store.record_mention(42, i2.id, true).unwrap();
        assert!(store.get_not_mentioned_music(42).unwrap().is_empty());
        assert_eq!(store.get_not_heard_before_music(42).unwrap(), vec![i1]);
    }

    #[test]
    fn test_mention_filters_are_per_user() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        store.record_mention(1, item.id, false).unwrap();

        // Another user's mention does not affect this user's filters.
        assert_eq!(store.get_not_mentioned_music(2).unwrap(), vec![item]);
        assert!(store.get_not_heard_before_music(2).unwrap().is_empty());
    }

    #[test]
    fn test_create_rating_conflicts_on_existing_pair() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        store.create_rating(42, item.id, 4).unwrap();
        let err = store.create_rating(42, item.id, 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::RatingConflict { .. })
        ));

        // The stored value is untouched by the failed create.
        assert_eq!(store.get_rating(42, item.id).unwrap().unwrap().rating, 4);
    }

    #[test]
    fn test_create_rating_on_missing_music_is_not_found() {
        let (store, _tmp) = create_test_store();

        let err = store.create_rating(42, 999, 4).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_edit_rating_upserts() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        // Edit with no prior rating inserts.
        store.edit_rating(42, item.id, 3).unwrap();
        assert_eq!(store.get_rating(42, item.id).unwrap().unwrap().rating, 3);

        // Repeated edits replace the value in place, exactly one row remains.
        store.edit_rating(42, item.id, 5).unwrap();
        assert_eq!(store.get_rating(42, item.id).unwrap().unwrap().rating, 5);
        assert_eq!(store.get_ratings_for_music(item.id).unwrap().len(), 1);
    }

    #[test]
    fn test_rating_count_invariant_under_edits() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        store.create_rating(1, item.id, 2).unwrap();
        store.create_rating(2, item.id, 4).unwrap();
        assert_eq!(store.get_rating_count_for_music(item.id).unwrap(), 2);

        store.edit_rating(1, item.id, 5).unwrap();
        store.edit_rating(1, item.id, 1).unwrap();
        assert_eq!(store.get_rating_count_for_music(item.id).unwrap(), 2);
        assert_eq!(store.get_sum_total_rating_for_music(item.id).unwrap(), 5);
    }

    #[test]
    fn test_sum_total_is_zero_without_ratings() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        assert_eq!(store.get_sum_total_rating_for_music(item.id).unwrap(), 0);
        assert_eq!(store.get_rating_count_for_music(item.id).unwrap(), 0);
    }

    #[test]
    fn test_not_rated_music() {
        let (store, _tmp) = create_test_store();
        let i1 = add_music(&store, "Song One", "Artist One");
        let i2 = add_music(&store, "Song Two", "Artist Two");

        store.create_rating(42, i1.id, 4).unwrap();

        assert_eq!(store.get_not_rated_music(42).unwrap(), vec![i2.clone()]);
        // Rating and mention are independent signals.
        assert_eq!(
            store.get_not_mentioned_music(42).unwrap(),
            vec![i1, i2]
        );
    }

    #[test]
    fn test_discovery_scenario() {
        let (store, _tmp) = create_test_store();
        let i1 = add_music(&store, "Song One", "Artist One");

        store.record_mention(42, i1.id, false).unwrap();

        assert_eq!(store.get_not_heard_before_count(i1.id).unwrap(), 1);
        assert_eq!(store.get_heard_not_rated_count(i1.id).unwrap(), 1);
        assert!(store.get_not_rated_music(42).unwrap().contains(&i1));

        store.edit_rating(42, i1.id, 5).unwrap();

        assert_eq!(store.get_heard_not_rated_count(i1.id).unwrap(), 0);
        assert_eq!(store.get_rating_count_for_music(i1.id).unwrap(), 1);
        assert_eq!(store.get_sum_total_rating_for_music(i1.id).unwrap(), 5);
        // The mention-side count is unaffected by rating.
        assert_eq!(store.get_not_heard_before_count(i1.id).unwrap(), 1);
    }

    #[test]
    fn test_listen_clicks_are_append_only() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        let c1 = store.record_listen_click(42, item.id).unwrap();
        let c2 = store.record_listen_click(42, item.id).unwrap();
        let c3 = store.record_listen_click(42, item.id).unwrap();
        assert_ne!(c1.id, c2.id);
        assert_ne!(c2.id, c3.id);

        assert_eq!(store.get_stats().unwrap().listen_click_count, 3);
    }

    #[test]
    fn test_purge_listen_clicks_leaves_other_signals() {
        let (store, _tmp) = create_test_store();
        let item = add_music(&store, "Song One", "Artist One");

        store.record_listen_click(42, item.id).unwrap();
        store.record_listen_click(42, item.id).unwrap();
        store.record_listen_click(42, item.id).unwrap();
        store.record_listen_click(7, item.id).unwrap();
        store.create_rating(42, item.id, 5).unwrap();
        store.record_mention(42, item.id, true).unwrap();

        assert_eq!(store.purge_listen_clicks(42).unwrap(), 3);

        // Other users' clicks and this user's rating and mention survive.
        assert_eq!(store.get_stats().unwrap().listen_click_count, 1);
        assert_eq!(store.get_rating(42, item.id).unwrap().unwrap().rating, 5);
        assert_eq!(
            store.check_mention(42, item.id).unwrap(),
            MentionState::HeardBefore
        );

        // Purging again is not an error.
        assert_eq!(store.purge_listen_clicks(42).unwrap(), 0);
    }

    #[test]
    fn test_stats_count_all_tables() {
        let (store, _tmp) = create_test_store();
        let i1 = add_music(&store, "Song One", "Artist One");
        let i2 = add_music(&store, "Song Two", "Artist Two");

        store.record_mention(1, i1.id, false).unwrap();
        store.create_rating(1, i2.id, 3).unwrap();
        store.record_listen_click(1, i1.id).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.music_count, 2);
        assert_eq!(stats.mention_count, 1);
        assert_eq!(stats.rating_count, 1);
        assert_eq!(stats.listen_click_count, 1);
    }

    #[test]
    fn test_store_reopens_existing_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("discovery.db");

        let item = {
            let store = SqliteDiscoveryStore::new(&db_path).unwrap();
            add_music(&store, "Song One", "Artist One")
        };

        let store = SqliteDiscoveryStore::new(&db_path).unwrap();
        assert_eq!(store.get_music(item.id).unwrap().unwrap(), item);
    }
}
