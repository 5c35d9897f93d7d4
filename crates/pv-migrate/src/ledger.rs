//! Persistent record of applied schema changes.
//!
//! The ledger is a single table (`_migrations` by default) with one row per
//! applied change. Rows are ordered by a sequence-assigned `sequence` column,
//! so the newest row is always the current schema version.

use crate::connection::table_exists;
use crate::error::{MigrateError, MigrateResult};
use chrono::{DateTime, Utc};
use duckdb::Connection;
use pv_core::config::is_valid_identifier;

/// One applied change, as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Monotonic key assigned on insert.
    pub sequence: i64,
    /// Name of the applied change.
    pub name: String,
    /// When the change was recorded.
    pub applied_at: Option<DateTime<Utc>>,
}

/// Access to the ledger table.
///
/// Mutations take the caller's connection and never open a transaction of
/// their own; the engine wraps each change and its ledger write together.
#[derive(Debug, Clone)]
pub struct AppliedLedger {
    table: String,
}

impl AppliedLedger {
    /// Ledger backed by `table`, which must be a plain identifier.
    pub fn new(table: &str) -> MigrateResult<Self> {
        if !is_valid_identifier(table) {
            return Err(MigrateError::SetupError(format!(
                "'{table}' is not a valid ledger table name"
            )));
        }
        Ok(Self {
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn sequence_name(&self) -> String {
        format!("{}_seq", self.table)
    }

    /// Create the ledger table and its sequence if they are missing.
    pub fn ensure_exists(&self, conn: &Connection) -> MigrateResult<()> {
        let sql = format!(
            "CREATE SEQUENCE IF NOT EXISTS \"{seq}\";
             CREATE TABLE IF NOT EXISTS \"{table}\" (
                 \"sequence\" BIGINT PRIMARY KEY DEFAULT nextval('{seq}'),
                 name         VARCHAR NOT NULL,
                 applied_at   TIMESTAMP NOT NULL DEFAULT now()
             );",
            seq = self.sequence_name(),
            table = self.table,
        );
        conn.execute_batch(&sql).map_err(|e| {
            MigrateError::SetupError(format!("failed to create {} table: {e}", self.table))
        })
    }

    /// Returns true if the ledger table exists.
    pub fn exists(&self, conn: &Connection) -> MigrateResult<bool> {
        table_exists(conn, &self.table)
    }

    /// Name of the most recently applied change, or `None` if nothing is
    /// applied.
    pub fn latest(&self, conn: &Connection) -> MigrateResult<Option<String>> {
        let sql = format!(
            "SELECT name FROM \"{}\" ORDER BY \"sequence\" DESC LIMIT 1",
            self.table
        );
        let mut stmt = conn.prepare(&sql).map_err(ledger_err("read latest version"))?;
        let mut rows = stmt.query([]).map_err(ledger_err("read latest version"))?;
        let latest = match rows.next().map_err(ledger_err("read latest version"))? {
            Some(row) => Some(row.get::<_, String>(0)?),
            None => None,
        };
        Ok(latest)
    }

    /// Full history, newest first.
    pub fn all_descending(&self, conn: &Connection) -> MigrateResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT \"sequence\", name, epoch_ms(applied_at)
             FROM \"{}\"
             ORDER BY \"sequence\" DESC",
            self.table
        );
        let mut stmt = conn.prepare(&sql).map_err(ledger_err("read history"))?;
        let entries = stmt
            .query_map([], |row| {
                let applied_ms: Option<i64> = row.get(2)?;
                Ok(LedgerEntry {
                    sequence: row.get(0)?,
                    name: row.get(1)?,
                    applied_at: applied_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
                })
            })
            .map_err(ledger_err("read history"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(ledger_err("read history"))?;
        Ok(entries)
    }

    /// Record `name` as applied.
    pub fn record(&self, conn: &Connection, name: &str) -> MigrateResult<()> {
        let sql = format!("INSERT INTO \"{}\" (name) VALUES (?)", self.table);
        conn.execute(&sql, duckdb::params![name]).map_err(|e| {
            MigrateError::LedgerError(format!("failed to record '{name}': {e}"))
        })?;
        Ok(())
    }

    /// Remove the ledger entry for `name`.
    ///
    /// Fails if no entry matched, so an undo never commits without its
    /// bookkeeping.
    pub fn remove(&self, conn: &Connection, name: &str) -> MigrateResult<()> {
        let sql = format!("DELETE FROM \"{}\" WHERE name = ?", self.table);
        let deleted = conn.execute(&sql, duckdb::params![name]).map_err(|e| {
            MigrateError::LedgerError(format!("failed to remove '{name}': {e}"))
        })?;
        if deleted == 0 {
            return Err(MigrateError::LedgerError(format!(
                "no ledger entry named '{name}'"
            )));
        }
        Ok(())
    }

    /// Drop the ledger table and its sequence.
    pub fn drop_table(&self, conn: &Connection) -> MigrateResult<()> {
        let sql = format!(
            "DROP TABLE IF EXISTS \"{}\"; DROP SEQUENCE IF EXISTS \"{}\";",
            self.table,
            self.sequence_name()
        );
        conn.execute_batch(&sql).map_err(|e| {
            MigrateError::LedgerError(format!("failed to drop {} table: {e}", self.table))
        })
    }
}

fn ledger_err(action: &'static str) -> impl Fn(duckdb::Error) -> MigrateError {
    move |e| MigrateError::LedgerError(format!("failed to {action}: {e}"))
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
