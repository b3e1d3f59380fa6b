//! Discovery store: the music catalog plus the three per-(user, music)
//! interaction signals (mentions, ratings, listen clicks), all in one
//! SQLite database so the filtering queries can join across them.

mod error;
mod models;
mod schema;
mod store;
mod trait_def;

pub use error::StoreError;
pub use models::{DiscoveryStats, ListenClick, Mention, MentionState, MusicItem, Rating};
pub use schema::DISCOVERY_VERSIONED_SCHEMAS;
pub use store::SqliteDiscoveryStore;
pub use trait_def::{CatalogStore, InteractionStore};
