//! The migration engine.
//!
//! [`MigrationEngine`] compares the [`ChangeCatalog`] with the
//! [`AppliedLedger`] and drives one transaction per change. A change's schema
//! effect and its ledger row commit or roll back together; a pass stops at
//! the first failure so the ledger always matches the real schema and a
//! retry picks up where the last run stopped.
//!
//! The engine assumes it is the only writer for the duration of a call.
//! There is no locking between concurrent engines on the same database.

use crate::catalog::ChangeCatalog;
use crate::change::{Direction, SchemaChange};
use crate::connection::SchemaDb;
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::AppliedLedger;
use crate::report::Report;
use crate::status::{build_status, ChangeStatus};
use pv_core::{Config, CoreResult, DatabaseConfig};
use std::collections::HashMap;

/// Everything needed to construct an engine against a real database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Database to migrate.
    pub database: DatabaseConfig,
    /// Ledger table name.
    pub ledger_table: String,
}

impl MigrationConfig {
    /// Resolve the database (optionally through a named target) and ledger
    /// table from a project config.
    pub fn from_config(config: &Config, target: Option<&str>) -> CoreResult<Self> {
        Ok(Self {
            database: config.get_database_config(target)?,
            ledger_table: config.migrations.table.clone(),
        })
    }

    /// Replace the database path, e.g. from a `--database` flag.
    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database.path = path.into();
        self
    }
}

/// What [`MigrationEngine::regenerate`] did, plus the first error that
/// stopped either of its halves.
#[derive(Debug)]
pub struct RegenerateOutcome {
    /// Entries from every change that was reverted, applied, skipped or
    /// found drifted, undo entries first.
    pub report: Report,
    /// The first fatal error from `reset` or `sync`.
    pub error: Option<MigrateError>,
}

impl RegenerateOutcome {
    /// The combined report, or the first fatal error.
    pub fn into_result(self) -> MigrateResult<Report> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.report),
        }
    }
}

/// Applies and reverts schema changes against one database.
pub struct MigrationEngine {
    db: SchemaDb,
    catalog: ChangeCatalog,
    ledger: AppliedLedger,
}

impl MigrationEngine {
    /// Engine over an already-open database.
    pub fn new(db: SchemaDb, catalog: ChangeCatalog, ledger: AppliedLedger) -> Self {
        Self {
            db,
            catalog,
            ledger,
        }
    }

    /// Open the configured database and build an engine for `catalog`.
    pub fn open(config: &MigrationConfig, catalog: ChangeCatalog) -> MigrateResult<Self> {
        let ledger = AppliedLedger::new(&config.ledger_table)?;
        let db = SchemaDb::from_config(&config.database)?;
        Ok(Self::new(db, catalog, ledger))
    }

    pub fn db(&self) -> &SchemaDb {
        &self.db
    }

    pub fn catalog(&self) -> &ChangeCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &AppliedLedger {
        &self.ledger
    }

    /// Name of the most recently applied change.
    pub fn current_version(&self) -> MigrateResult<Option<String>> {
        self.ledger.ensure_exists(self.db.conn())?;
        self.ledger.latest(self.db.conn())
    }

    /// Apply every outstanding change, oldest first.
    ///
    /// Stops at the first failing change; the ones after it are reported as
    /// skipped. Fails outright if the ledger cannot be set up or if the
    /// current version is not in the catalog.
    pub fn sync(&self) -> MigrateResult<Report> {
        let current = self.current_version()?;
        let pending = self.pending_after(current.as_deref())?;
        log::info!("{} migration(s) to apply", pending.len());

        let mut report = Report::new();
        let mut remaining = pending.iter();
        for change in remaining.by_ref() {
            match self.apply_one(change) {
                Ok(()) => {
                    log::debug!("Applied {}", change.name);
                    report.push_applied(change.name);
                }
                Err(err) => {
                    log::warn!("{err}");
                    report.push_failed(change.name, Direction::Apply, &err);
                    break;
                }
            }
        }
        for change in remaining {
            report.push_skipped(change.name, Direction::Apply);
        }

        log::info!(
            "Applied {} of {} pending migration(s)",
            report.succeeded(),
            pending.len()
        );
        Ok(report)
    }

    /// Undo every applied change, newest first.
    ///
    /// Ledger entries with no catalog counterpart are reported as drift and
    /// left in place; they do not stop the remaining undos. The first failing
    /// undo halts the pass and leaves older entries applied.
    pub fn reset(&self) -> MigrateResult<Report> {
        let conn = self.db.conn();
        self.ledger.ensure_exists(conn)?;
        let entries = self.ledger.all_descending(conn)?;
        let lookup: HashMap<&str, &SchemaChange> =
            self.catalog.iter().map(|c| (c.name, c)).collect();
        log::info!("{} migration(s) to reset", entries.len());

        let mut report = Report::new();
        let mut halted = false;
        for entry in &entries {
            let Some(change) = lookup.get(entry.name.as_str()) else {
                let err = MigrateError::DriftError {
                    name: entry.name.clone(),
                };
                log::warn!("{err}");
                report.push_drift(&entry.name, &err);
                continue;
            };
            if halted {
                report.push_skipped(change.name, Direction::Undo);
                continue;
            }
            match self.undo_one(change) {
                Ok(()) => {
                    log::debug!("Reverted {}", change.name);
                    report.push_reverted(change.name);
                }
                Err(err) => {
                    log::warn!("{err}");
                    report.push_failed(change.name, Direction::Undo, &err);
                    halted = true;
                }
            }
        }

        log::info!("Reverted {} migration(s)", report.succeeded());
        Ok(report)
    }

    /// [`reset`](Self::reset) followed by [`sync`](Self::sync).
    ///
    /// `sync` runs even when `reset` fails. The combined report lists the
    /// undo entries first and keeps whatever either half did, even when the
    /// other half failed outright; the first such error is carried alongside.
    pub fn regenerate(&self) -> RegenerateOutcome {
        let mut report = Report::new();
        let mut error = None;

        match self.reset() {
            Ok(undone) => report.extend(undone),
            Err(err) => {
                log::warn!("Reset failed, syncing anyway: {err}");
                error = Some(err);
            }
        }
        match self.sync() {
            Ok(applied) => report.extend(applied),
            Err(err) => {
                log::warn!("Sync after reset failed: {err}");
                if error.is_none() {
                    error = Some(err);
                }
            }
        }

        RegenerateOutcome { report, error }
    }

    /// Every catalog change with its applied/pending state, followed by
    /// ledger entries the catalog does not define.
    pub fn status(&self) -> MigrateResult<Vec<ChangeStatus>> {
        self.ledger.ensure_exists(self.db.conn())?;
        let entries = self.ledger.all_descending(self.db.conn())?;
        Ok(build_status(&self.catalog, &entries))
    }

    /// Drop the ledger table. Schema objects created by applied changes are
    /// left alone.
    pub fn teardown(&self) -> MigrateResult<()> {
        self.ledger.drop_table(self.db.conn())?;
        log::info!("Dropped migration ledger {}", self.ledger.table());
        Ok(())
    }

    /// Catalog changes strictly after `current`.
    fn pending_after(&self, current: Option<&str>) -> MigrateResult<&[SchemaChange]> {
        let changes = self.catalog.changes();
        let Some(name) = current else {
            return Ok(changes);
        };
        match self.catalog.position(name) {
            Some(index) => Ok(&changes[index + 1..]),
            None => {
                let err = MigrateError::DriftError {
                    name: name.to_string(),
                };
                log::warn!("{err}");
                Err(err)
            }
        }
    }

    fn apply_one(&self, change: &SchemaChange) -> MigrateResult<()> {
        self.db.transaction(|conn| {
            change.apply(conn)?;
            self.ledger.record(conn, change.name)
        })
    }

    fn undo_one(&self, change: &SchemaChange) -> MigrateResult<()> {
        self.db.transaction(|conn| {
            change.undo(conn)?;
            self.ledger.remove(conn, change.name)
        })
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
