//! SQLite schema definitions for the discovery database.

use crate::sqlite_persistence::{Table, VersionedSchema};

const MUSIC_TABLE_V_0: Table = Table {
    name: "music",
    schema: "CREATE TABLE music (id INTEGER NOT NULL UNIQUE, title TEXT NOT NULL, album TEXT NOT NULL, artist TEXT NOT NULL, listen_link TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id), UNIQUE (title, artist));",
    indices: &["CREATE INDEX music_title_index ON music (title);"],
};

const MENTIONS_TABLE_V_0: Table = Table {
    name: "mentions",
    schema: "CREATE TABLE mentions (user_id INTEGER NOT NULL, music_id INTEGER NOT NULL, mentioned INTEGER NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), UNIQUE (user_id, music_id), CONSTRAINT music_id FOREIGN KEY (music_id) REFERENCES music (id));",
    indices: &["CREATE INDEX mentions_music_id_index ON mentions (music_id);"],
};

const RATINGS_TABLE_V_0: Table = Table {
    name: "ratings",
    schema: "CREATE TABLE ratings (user_id INTEGER NOT NULL, music_id INTEGER NOT NULL, rating INTEGER NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), UNIQUE (user_id, music_id), CONSTRAINT music_id FOREIGN KEY (music_id) REFERENCES music (id));",
    indices: &["CREATE INDEX ratings_music_id_index ON ratings (music_id);"],
};

// No uniqueness constraint: every click is its own row.
const LISTEN_CLICKS_TABLE_V_0: Table = Table {
    name: "listen_clicks",
    schema: "CREATE TABLE listen_clicks (id INTEGER NOT NULL UNIQUE, user_id INTEGER NOT NULL, music_id INTEGER NOT NULL, click INTEGER NOT NULL DEFAULT 1, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id), CONSTRAINT music_id FOREIGN KEY (music_id) REFERENCES music (id));",
    indices: &["CREATE INDEX listen_clicks_user_id_index ON listen_clicks (user_id);"],
};

pub const DISCOVERY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        MUSIC_TABLE_V_0,
        MENTIONS_TABLE_V_0,
        RATINGS_TABLE_V_0,
        LISTEN_CLICKS_TABLE_V_0,
    ],
    migration: None,
}];
