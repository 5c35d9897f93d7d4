//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use pv_core::Config;
use pv_migrate::{ChangeCatalog, MigrationConfig, MigrationEngine};
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the database is closed properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main() exits without printing this.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the project config from `--config` or the project directory.
///
/// A project directory without a config file falls back to defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path)).context("Failed to load configuration file"),
        None => Config::load_from_dir_or_default(Path::new(&global.project_dir))
            .context("Failed to load project configuration"),
    }
}

/// Resolve the database and ledger settings for this invocation.
///
/// Priority for the database path: `--database` / `DB_URI`, then the
/// selected target, then the base config. Relative paths from the config are
/// taken relative to the project directory.
pub(crate) fn migration_config(global: &GlobalArgs) -> Result<MigrationConfig> {
    let config = load_config(global)?;
    let target = Config::resolve_target(global.target.as_deref());
    let resolved = MigrationConfig::from_config(&config, target.as_deref())
        .context("Failed to resolve database target")?;

    if let Some(path) = &global.database {
        return Ok(resolved.with_database_path(path.clone()));
    }

    if resolved.database.is_memory() || Path::new(&resolved.database.path).is_absolute() {
        return Ok(resolved);
    }
    let path = Path::new(&global.project_dir).join(&resolved.database.path);
    Ok(resolved.with_database_path(path.display().to_string()))
}

/// Open a migration engine over the built-in catalog.
pub(crate) fn open_engine(global: &GlobalArgs) -> Result<MigrationEngine> {
    let config = migration_config(global)?;
    log::debug!(
        "Using database {} (ledger table {})",
        config.database.path,
        config.ledger_table
    );
    let catalog = ChangeCatalog::builtin().context("Built-in migration catalog is invalid")?;
    MigrationEngine::open(&config, catalog)
        .with_context(|| format!("Failed to open database {}", config.database.path))
}

/// Calculate the display width of each column.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Render a left-aligned table: header, dash separator, then rows.
/// Columns are separated by two spaces.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let widths = calculate_column_widths(headers, rows);
    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Print a formatted table to stdout.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in format_table(headers, rows) {
        println!("{line}");
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
