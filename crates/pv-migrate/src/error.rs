//! Error types for the migration engine.

use crate::change::Direction;
use thiserror::Error;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Failed to open or create the database (MG001).
    #[error("[MG001] Database connection failed: {0}")]
    ConnectionError(String),

    /// The ledger table could not be created or verified (MG002).
    #[error("[MG002] Migration ledger setup failed: {0}")]
    SetupError(String),

    /// A schema change failed to apply or undo (MG003).
    #[error("[MG003] Change '{name}' failed to {direction}: {message}")]
    ChangeError {
        name: String,
        direction: Direction,
        message: String,
    },

    /// A ledger entry names a change the catalog does not define (MG004).
    #[error("[MG004] Ledger entry '{name}' has no matching change in the catalog")]
    DriftError { name: String },

    /// Reading or writing the ledger failed (MG005).
    #[error("[MG005] Migration ledger query failed: {0}")]
    LedgerError(String),

    /// Transaction management error (MG006).
    #[error("[MG006] Transaction failed: {0}")]
    TransactionError(String),

    /// The change catalog is malformed (MG007).
    #[error("[MG007] Invalid change catalog: {0}")]
    CatalogError(String),

    /// DuckDB driver error with preserved source chain (MG008).
    #[error("[MG008] DuckDB error")]
    DuckDb(#[source] duckdb::Error),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<duckdb::Error> for MigrateError {
    fn from(err: duckdb::Error) -> Self {
        MigrateError::DuckDb(err)
    }
}

impl MigrateError {
    /// Name of the change this error is about, if any.
    pub fn change_name(&self) -> Option<&str> {
        match self {
            MigrateError::ChangeError { name, .. } | MigrateError::DriftError { name } => {
                Some(name)
            }
            _ => None,
        }
    }
}
