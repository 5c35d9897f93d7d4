//! Database connection wrapper.
//!
//! [`SchemaDb`] owns the single DuckDB [`Connection`] a migration run works
//! against and provides the per-change transaction boundary.

use crate::error::{MigrateError, MigrateResult};
use duckdb::Connection;
use pv_core::DatabaseConfig;
use std::path::Path;

/// Wrapper around the DuckDB connection holding the Postervote schema.
///
/// Single-threaded: one engine owns the connection for the whole run.
pub struct SchemaDb {
    conn: Connection,
}

impl SchemaDb {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> MigrateResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| MigrateError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create an empty in-memory database.
    pub fn open_memory() -> MigrateResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MigrateError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open the database described by `config` (handles the `:memory:` path).
    pub fn from_config(config: &DatabaseConfig) -> MigrateResult<Self> {
        if config.is_memory() {
            Self::open_memory()
        } else {
            Self::open(Path::new(&config.path))
        }
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    pub fn transaction<F, T>(&self, body: F) -> MigrateResult<T>
    where
        F: FnOnce(&Connection) -> MigrateResult<T>,
    {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| MigrateError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&self.conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(MigrateError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    /// Returns true if a table named `name` exists in the current schema.
    pub fn table_exists(&self, name: &str) -> MigrateResult<bool> {
        table_exists(&self.conn, name)
    }
}

/// Returns true if a table named `name` exists, as seen through `conn`.
pub(crate) fn table_exists(conn: &Connection, name: &str) -> MigrateResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_schema = current_schema() AND table_name = ?",
        duckdb::params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
