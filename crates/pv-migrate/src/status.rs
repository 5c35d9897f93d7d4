//! Catalog-versus-ledger status listing.

use crate::catalog::ChangeCatalog;
use crate::ledger::LedgerEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Whether a change is reflected in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Applied,
    Pending,
    /// In the ledger but unknown to the catalog
    Drift,
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeState::Applied => write!(f, "applied"),
            ChangeState::Pending => write!(f, "pending"),
            ChangeState::Drift => write!(f, "drift"),
        }
    }
}

/// One row of the status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeStatus {
    pub name: String,
    pub state: ChangeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
}

/// Annotate every catalog change with its ledger state, then append ledger
/// entries the catalog does not know about.
///
/// `ledger` may be in any order; drift rows come out oldest first.
pub fn build_status(catalog: &ChangeCatalog, ledger: &[LedgerEntry]) -> Vec<ChangeStatus> {
    let applied: HashMap<&str, &LedgerEntry> =
        ledger.iter().map(|e| (e.name.as_str(), e)).collect();

    let mut rows: Vec<ChangeStatus> = catalog
        .iter()
        .map(|change| match applied.get(change.name) {
            Some(entry) => ChangeStatus {
                name: change.name.to_string(),
                state: ChangeState::Applied,
                sequence: Some(entry.sequence),
                applied_at: entry.applied_at,
            },
            None => ChangeStatus {
                name: change.name.to_string(),
                state: ChangeState::Pending,
                sequence: None,
                applied_at: None,
            },
        })
        .collect();

    let mut drift: Vec<&LedgerEntry> = ledger
        .iter()
        .filter(|e| catalog.position(&e.name).is_none())
        .collect();
    drift.sort_by_key(|e| e.sequence);
    rows.extend(drift.into_iter().map(|entry| ChangeStatus {
        name: entry.name.clone(),
        state: ChangeState::Drift,
        sequence: Some(entry.sequence),
        applied_at: entry.applied_at,
    }));

    rows
}
