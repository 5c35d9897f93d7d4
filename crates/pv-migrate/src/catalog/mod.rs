//! The ordered list of schema changes known to this binary.
//!
//! Each built-in change is a pair of numbered `.sql` files embedded via
//! `include_str!`. Order comes from the numeric name prefix, never from the
//! order changes were registered in.

use crate::change::SchemaChange;
use crate::error::{MigrateError, MigrateResult};

/// The Postervote schema history, oldest first.
pub static BUILTIN_CHANGES: &[SchemaChange] = &[
    SchemaChange::new(
        "001_add_posters",
        include_str!("001_add_posters.up.sql"),
        include_str!("001_add_posters.down.sql"),
    ),
    SchemaChange::new(
        "002_add_poster_options",
        include_str!("002_add_poster_options.up.sql"),
        include_str!("002_add_poster_options.down.sql"),
    ),
    SchemaChange::new(
        "003_add_devices",
        include_str!("003_add_devices.up.sql"),
        include_str!("003_add_devices.down.sql"),
    ),
    SchemaChange::new(
        "004_add_device_counts",
        include_str!("004_add_device_counts.up.sql"),
        include_str!("004_add_device_counts.down.sql"),
    ),
    SchemaChange::new(
        "005_add_devices_label",
        include_str!("005_add_devices_label.up.sql"),
        include_str!("005_add_devices_label.down.sql"),
    ),
];

/// A validated, totally ordered set of [`SchemaChange`]s.
#[derive(Debug, Clone)]
pub struct ChangeCatalog {
    changes: Vec<SchemaChange>,
}

impl ChangeCatalog {
    /// Build a catalog from `changes`, ordering them by numeric prefix.
    ///
    /// Every name must look like `NNN_description`, and no two changes may
    /// share a prefix.
    pub fn new(changes: impl IntoIterator<Item = SchemaChange>) -> MigrateResult<Self> {
        let mut keyed = Vec::new();
        for change in changes {
            let prefix = change.prefix().ok_or_else(|| {
                MigrateError::CatalogError(format!(
                    "change name '{}' must start with a numeric prefix followed by '_'",
                    change.name
                ))
            })?;
            keyed.push((prefix, change));
        }
        keyed.sort_by_key(|(prefix, _)| *prefix);

        for pair in keyed.windows(2) {
            let ((prev_prefix, prev), (prefix, change)) = (&pair[0], &pair[1]);
            if prev.name == change.name {
                return Err(MigrateError::CatalogError(format!(
                    "duplicate change name '{}'",
                    change.name
                )));
            }
            if prev_prefix == prefix {
                return Err(MigrateError::CatalogError(format!(
                    "changes '{}' and '{}' share prefix {prefix}",
                    prev.name, change.name
                )));
            }
        }

        Ok(Self {
            changes: keyed.into_iter().map(|(_, change)| change).collect(),
        })
    }

    /// The Postervote schema history, validated like any other catalog.
    pub fn builtin() -> MigrateResult<Self> {
        Self::new(BUILTIN_CHANGES.iter().copied())
    }

    /// All changes, oldest first.
    pub fn changes(&self) -> &[SchemaChange] {
        &self.changes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SchemaChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Index of the change called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.changes.iter().position(|c| c.name == name)
    }

    /// Look up a change by name.
    pub fn get(&self, name: &str) -> Option<&SchemaChange> {
        self.changes.iter().find(|c| c.name == name)
    }

    /// Change names in catalog order.
    pub fn names(&self) -> Vec<&'static str> {
        self.changes.iter().map(|c| c.name).collect()
    }

    /// The newest change, if any.
    pub fn last(&self) -> Option<&SchemaChange> {
        self.changes.last()
    }
}

impl<'a> IntoIterator for &'a ChangeCatalog {
    type Item = &'a SchemaChange;
    type IntoIter = std::slice::Iter<'a, SchemaChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
