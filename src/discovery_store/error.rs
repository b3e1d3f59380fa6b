use thiserror::Error;

/// Typed store failures the HTTP layer maps to status codes. Anything else
/// coming out of the store is treated as a generic storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("user {user_id} has already rated music {music_id}")]
    RatingConflict { user_id: i64, music_id: i64 },

    #[error("music '{title}' by '{artist}' already exists")]
    MusicConflict { title: String, artist: String },
}
