//! Schema migration engine for Postervote.
//!
//! Evolves the DuckDB schema through a statically registered, strictly
//! ordered list of [`SchemaChange`]s. Applied changes are tracked in a
//! ledger table; [`MigrationEngine`] applies outstanding changes oldest
//! first and reverts applied ones newest first, one transaction per change.

pub mod catalog;
pub mod change;
pub mod connection;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod report;
pub mod status;

pub use catalog::ChangeCatalog;
pub use change::{Direction, SchemaChange};
pub use connection::SchemaDb;
pub use engine::{MigrationConfig, MigrationEngine, RegenerateOutcome};
pub use error::{MigrateError, MigrateResult};
pub use ledger::{AppliedLedger, LedgerEntry};
pub use report::{Outcome, Report, ReportEntry};
pub use status::{ChangeState, ChangeStatus};
