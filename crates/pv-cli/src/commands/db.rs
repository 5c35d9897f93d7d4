//! Database schema commands: migrate, destroy, regenerate, version, status,
//! teardown.

use anyhow::{Context, Result};
use pv_migrate::{ChangeStatus, MigrationEngine, Outcome, Report, ReportEntry};

use crate::cli::{DbArgs, DbCommands, GlobalArgs, PassArgs, StatusArgs};
use crate::commands::common::{self, ExitCode};

const CHECK: &str = "✔";
const CROSS: &str = "✖";

/// Execute the db command.
pub async fn execute(args: &DbArgs, global: &GlobalArgs) -> Result<()> {
    match &args.command {
        DbCommands::Migrate(pass_args) => {
            execute_pass(pass_args, global, "Migrate", MigrationEngine::sync).await
        }
        DbCommands::Destroy(pass_args) => {
            execute_pass(pass_args, global, "Destroy", MigrationEngine::reset).await
        }
        DbCommands::Regenerate(pass_args) => execute_regenerate(pass_args, global).await,
        DbCommands::Version => execute_version(global).await,
        DbCommands::Status(status_args) => execute_status(status_args, global).await,
        DbCommands::Teardown => execute_teardown(global).await,
    }
}

async fn execute_pass(
    args: &PassArgs,
    global: &GlobalArgs,
    label: &str,
    pass: fn(&MigrationEngine) -> pv_migrate::MigrateResult<Report>,
) -> Result<()> {
    let engine = common::open_engine(global)?;
    let report = pass(&engine).with_context(|| format!("{label} aborted"))?;
    print_report(args, label, &report)?;
    exit_on_failure(&report)
}

/// Prints whatever regenerate did before returning its fatal error, if any.
async fn execute_regenerate(args: &PassArgs, global: &GlobalArgs) -> Result<()> {
    let engine = common::open_engine(global)?;
    let outcome = engine.regenerate();
    print_report(args, "Regenerate", &outcome.report)?;
    if let Some(err) = outcome.error {
        return Err(err).context("Regenerate aborted");
    }
    exit_on_failure(&outcome.report)
}

fn print_report(args: &PassArgs, label: &str, report: &Report) -> Result<()> {
    if args.json {
        let output = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{output}");
    } else {
        for line in format_report(report) {
            println!("{line}");
        }
        println!("\n{}", format_summary(label, report));
    }
    Ok(())
}

fn exit_on_failure(report: &Report) -> Result<()> {
    if !report.is_success() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

async fn execute_version(global: &GlobalArgs) -> Result<()> {
    let engine = common::open_engine(global)?;
    let version = engine
        .current_version()
        .context("Failed to read current version")?;
    println!("{}", version.as_deref().unwrap_or("(none)"));
    Ok(())
}

async fn execute_status(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let engine = common::open_engine(global)?;
    let status = engine.status().context("Failed to read migration status")?;

    if args.json {
        let output =
            serde_json::to_string_pretty(&status).context("Failed to serialize status")?;
        println!("{output}");
        return Ok(());
    }

    if status.is_empty() {
        println!("(no migrations)");
        return Ok(());
    }
    common::print_table(&["NAME", "STATE", "APPLIED AT"], &status_rows(&status));
    Ok(())
}

async fn execute_teardown(global: &GlobalArgs) -> Result<()> {
    let engine = common::open_engine(global)?;
    engine
        .teardown()
        .context("Failed to drop migration ledger")?;
    println!("Dropped migration ledger '{}'", engine.ledger().table());
    Ok(())
}

/// One line per report entry: mark, name, and detail on failure.
pub(crate) fn format_report(report: &Report) -> Vec<String> {
    if report.is_empty() {
        return vec!["Nothing to do".to_string()];
    }
    report.entries.iter().map(format_entry).collect()
}

fn format_entry(entry: &ReportEntry) -> String {
    match entry.outcome {
        Outcome::Applied | Outcome::Reverted => {
            format!("  {CHECK} {} ({})", entry.name, entry.outcome)
        }
        Outcome::Skipped => format!("  - {} (skipped)", entry.name),
        Outcome::Failed | Outcome::Drift => format!(
            "  {CROSS} {} ({}): {}",
            entry.name,
            entry.outcome,
            entry.detail.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Final count line, e.g. `Migrate: 2 succeeded, 1 failed, 1 skipped`.
pub(crate) fn format_summary(label: &str, report: &Report) -> String {
    let mut parts = vec![format!("{} succeeded", report.succeeded())];
    for outcome in [Outcome::Failed, Outcome::Skipped, Outcome::Drift] {
        let n = report.count(outcome);
        if n > 0 {
            parts.push(format!("{n} {outcome}"));
        }
    }
    format!("{label}: {}", parts.join(", "))
}

fn status_rows(status: &[ChangeStatus]) -> Vec<Vec<String>> {
    status
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.state.to_string(),
                s.applied_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect()
}

#[cfg(test)]
#[path = "db_test.rs"]
mod tests;
