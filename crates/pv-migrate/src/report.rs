//! Structured results of a migration pass.

use crate::change::Direction;
use crate::error::MigrateError;
use serde::Serialize;
use std::fmt;

/// What happened to one change during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Forward operation committed with its ledger entry
    Applied,
    /// Reverse operation committed and the ledger entry removed
    Reverted,
    /// Not attempted because an earlier change failed
    Skipped,
    /// Operation failed and was rolled back
    Failed,
    /// Ledger entry has no matching change in the catalog
    Drift,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::Reverted => write!(f, "reverted"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Drift => write!(f, "drift"),
        }
    }
}

/// One line of a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub action: Direction,
    pub outcome: Outcome,
    /// Error text for failed and drift entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Per-change results of `sync`, `reset` or `regenerate`, in the order the
/// engine processed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, action: Direction, outcome: Outcome, detail: Option<String>) {
        self.entries.push(ReportEntry {
            name: name.to_string(),
            action,
            outcome,
            detail,
        });
    }

    pub(crate) fn push_applied(&mut self, name: &str) {
        self.push(name, Direction::Apply, Outcome::Applied, None);
    }

    pub(crate) fn push_reverted(&mut self, name: &str) {
        self.push(name, Direction::Undo, Outcome::Reverted, None);
    }

    pub(crate) fn push_skipped(&mut self, name: &str, action: Direction) {
        self.push(name, action, Outcome::Skipped, None);
    }

    pub(crate) fn push_failed(&mut self, name: &str, action: Direction, err: &MigrateError) {
        self.push(name, action, Outcome::Failed, Some(err.to_string()));
    }

    pub(crate) fn push_drift(&mut self, name: &str, err: &MigrateError) {
        self.push(name, Direction::Undo, Outcome::Drift, Some(err.to_string()));
    }

    /// Append all entries of `other`.
    pub fn extend(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    /// Number of entries with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Changes whose operation was actually run (successfully or not).
    pub fn attempted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.outcome,
                    Outcome::Applied | Outcome::Reverted | Outcome::Failed
                )
            })
            .count()
    }

    /// Changes that committed.
    pub fn succeeded(&self) -> usize {
        self.count(Outcome::Applied) + self.count(Outcome::Reverted)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    /// True when nothing failed and no drift was found.
    pub fn is_success(&self) -> bool {
        !self
            .entries
            .iter()
            .any(|e| matches!(e.outcome, Outcome::Failed | Outcome::Drift))
    }

    /// The first failed entry, if any.
    pub fn first_failure(&self) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.outcome == Outcome::Failed)
    }

    /// Names of entries with the given outcome, in report order.
    pub fn names_with(&self, outcome: Outcome) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
