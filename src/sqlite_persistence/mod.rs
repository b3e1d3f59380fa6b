//! Shared SQLite schema versioning machinery.

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

/// Offset applied to `PRAGMA user_version` so a database created by an
/// unrelated tool (user_version 0) is not mistaken for schema version 0.
pub const BASE_DB_VERSION: usize = 199;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&rusqlite::Transaction) -> Result<()>>,
}

impl VersionedSchema {
    /// Creates all tables and indices of this schema version on a fresh
    /// database and stamps the user_version pragma.
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            conn.execute(table.schema, [])?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        conn.pragma_update(None, "user_version", BASE_DB_VERSION + self.version)?;
        Ok(())
    }
}

/// Creates the latest schema on an empty database, or walks an existing one
/// forward through the migrations it is missing, inside a single transaction.
pub fn migrate_if_needed(conn: &mut Connection, schemas: &[VersionedSchema]) -> Result<()> {
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    let latest = match schemas.last() {
        Some(schema) => schema,
        None => bail!("No schema versions defined"),
    };

    if table_count == 0 {
        info!("Creating db schema at version {}", latest.version);
        return latest.create(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let mut current_version = if db_version < BASE_DB_VERSION as i64 {
        0
    } else {
        (db_version - BASE_DB_VERSION as i64) as usize
    };

    if current_version > latest.version {
        bail!("Database version {} is too new", current_version);
    }
    if current_version == latest.version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in schemas.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}
