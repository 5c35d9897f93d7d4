//! A single reversible schema change.

use crate::error::{MigrateError, MigrateResult};
use duckdb::Connection;
use serde::Serialize;
use std::fmt;

/// Which way a change is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Forward operation (`up`)
    Apply,
    /// Reverse operation (`down`)
    Undo,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Apply => write!(f, "apply"),
            Direction::Undo => write!(f, "undo"),
        }
    }
}

/// An immutable, named pair of forward and reverse SQL batches.
///
/// The name carries a numeric prefix (`001_`, `002_`, ...) that fixes its
/// position in the [`ChangeCatalog`](crate::ChangeCatalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaChange {
    /// Unique, prefix-ordered name, e.g. `001_add_posters`.
    pub name: &'static str,
    /// SQL executed by [`apply`](Self::apply).
    pub up: &'static str,
    /// SQL executed by [`undo`](Self::undo).
    pub down: &'static str,
}

impl SchemaChange {
    pub const fn new(name: &'static str, up: &'static str, down: &'static str) -> Self {
        Self { name, up, down }
    }

    /// Run the forward operation against `conn`.
    ///
    /// Callers are expected to hold an open transaction.
    pub fn apply(&self, conn: &Connection) -> MigrateResult<()> {
        self.run(conn, Direction::Apply)
    }

    /// Run the reverse operation against `conn`.
    pub fn undo(&self, conn: &Connection) -> MigrateResult<()> {
        self.run(conn, Direction::Undo)
    }

    /// Numeric ordering prefix of the name, if it has a well-formed one.
    pub fn prefix(&self) -> Option<u64> {
        parse_prefix(self.name)
    }

    fn run(&self, conn: &Connection, direction: Direction) -> MigrateResult<()> {
        let sql = match direction {
            Direction::Apply => self.up,
            Direction::Undo => self.down,
        };
        conn.execute_batch(sql)
            .map_err(|e| MigrateError::ChangeError {
                name: self.name.to_string(),
                direction,
                message: e.to_string(),
            })
    }
}

/// Parse the `NNN` out of `NNN_description`.
///
/// Returns `None` unless the name is digits, an underscore, then a
/// non-empty description.
pub(crate) fn parse_prefix(name: &str) -> Option<u64> {
    let (prefix, rest) = name.split_once('_')?;
    if prefix.is_empty() || rest.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
