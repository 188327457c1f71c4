//! Local profile store.
//!
//! Profiles live in a SQLite database with one row per evaluated system.
//! The sampling engine only talks to the [`ProfileStore`] trait, so the
//! store handle is always passed in explicitly.

pub mod document;

use crate::error::{Result, SampleError};
use crate::models::{SystemId, SystemProfile};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub use document::decode_profile;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS system (
    inventory_id TEXT NOT NULL UNIQUE,
    profile_json TEXT NOT NULL
);
"#;

/// Read access to evaluated system profiles.
pub trait ProfileStore {
    /// Number of evaluated systems.
    fn population(&self) -> Result<u64>;

    /// Up to `n` distinct identifiers in random order, using the store's
    /// native random ordering.
    fn random_ids(&self, n: u64) -> Result<Vec<SystemId>>;

    /// Visit every evaluated identifier once, in identifier order.
    fn for_each_id(&self, visit: &mut dyn FnMut(SystemId)) -> Result<()>;

    /// Load and decode one profile.
    fn fetch(&self, id: &str) -> Result<SystemProfile>;
}

/// SQLite-backed profile store.
pub struct SqliteProfileStore {
    conn: Connection,
}

impl SqliteProfileStore {
    /// Open an existing database for sampling.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(30))?;
        debug!("Opened profile store read-only: {}", path.display());
        Ok(Self { conn })
    }

    /// Open or create a database for importing, making sure the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(30))?;
        let store = Self { conn };
        store.ensure_schema()?;
        debug!("Opened profile store: {}", path.display());
        Ok(store)
    }

    /// In-memory store with the schema in place.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert `(inventory_id, profile_json)` rows in one transaction.
    ///
    /// Rows whose id already exists are left untouched. Returns the number
    /// of rows actually inserted.
    pub fn insert_profiles(&mut self, rows: &[(String, String)]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO system (inventory_id, profile_json) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
            )?;
            for (id, profile) in rows {
                inserted += stmt.execute(params![id, profile])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

impl ProfileStore for SqliteProfileStore {
    fn population(&self) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM system WHERE TRIM(profile_json, ' ' || char(9, 10, 13)) != ''",
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    fn random_ids(&self, n: u64) -> Result<Vec<SystemId>> {
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT inventory_id FROM system WHERE TRIM(profile_json, ' ' || char(9, 10, 13)) != '' ORDER BY RANDOM() LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }

    fn for_each_id(&self, visit: &mut dyn FnMut(SystemId)) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT inventory_id FROM system WHERE TRIM(profile_json, ' ' || char(9, 10, 13)) != '' ORDER BY inventory_id",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for id in rows {
            visit(id?);
        }
        Ok(())
    }

    fn fetch(&self, id: &str) -> Result<SystemProfile> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT profile_json FROM system WHERE inventory_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => decode_profile(id, &raw),
            None => Err(SampleError::UnknownSystem(id.to_string())),
        }
    }
}
