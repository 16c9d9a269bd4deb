//! SQLite store for keeper.
//!
//! There is no long-lived connection: each unit of work opens a connection,
//! runs inside one transaction, commits (or rolls back on error) and closes.
//!
//! # Invariants
//! - Every connection has `foreign_keys=ON`, so events cannot reference a
//!   missing trackable and deleting a trackable cascades to its events.
//! - The core never inspects or migrates plugin-owned tables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, Transaction};

use crate::error::Result;

pub mod migrations;
pub mod schema;

pub use migrations::{run_plugin_migrations, MigrationAction};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the database file. Cheap to clone; holds no open connection.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a configured connection.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Run `work` as one transaction on a fresh connection.
    ///
    /// The transaction commits when `work` returns `Ok`; on `Err` it is dropped,
    /// which rolls it back. The connection is closed either way.
    pub fn with_transaction<T>(
        &self,
        work: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let value = work(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Create the core tables and indexes if they do not exist.
    pub fn init_schema(&self) -> Result<()> {
        self.with_transaction(|tx| {
            for statement in schema::CORE_SCHEMA {
                tx.execute_batch(statement)?;
            }
            Ok(())
        })?;
        tracing::debug!(path = %self.path.display(), "core schema ready");
        Ok(())
    }

    /// Hard-delete a trackable and, through the cascade, its events.
    ///
    /// Not part of the Trackable API; plugins archive instead.
    pub fn delete_trackable(&self, id: i64) -> Result<bool> {
        self.with_transaction(|tx| {
            let changed = tx.execute("DELETE FROM trackables WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }

    /// Whether a table with this name exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        self.with_transaction(|tx| {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }
}
