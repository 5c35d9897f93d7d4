//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Postervote - schema migrations for the Postervote database
#[derive(Parser, Debug)]
#[command(name = "pv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Named target from the config (falls back to PV_TARGET)
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Database path, overriding the config and target
    #[arg(long, global = true, env = "DB_URI")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the database schema
    Db(DbArgs),
}

/// Arguments for the db command
#[derive(Args, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommands,
}

/// Schema migration subcommands
#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Apply all outstanding migrations
    Migrate(PassArgs),

    /// Undo every applied migration, newest first
    Destroy(PassArgs),

    /// Undo everything, then apply everything again
    Regenerate(PassArgs),

    /// Print the most recently applied migration
    Version,

    /// List migrations with their applied/pending state
    Status(StatusArgs),

    /// Drop the migration ledger table (schema objects are kept)
    Teardown,
}

/// Arguments shared by migrate, destroy and regenerate
#[derive(Args, Debug, Default)]
pub struct PassArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}
