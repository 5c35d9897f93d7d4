//! pv-core - Core library for Postervote
//!
//! This crate provides configuration parsing and the shared error type used
//! by the migration engine and the `pv` CLI.

pub mod config;
pub mod error;

pub use config::{Config, DatabaseConfig, MigrationsConfig, TargetConfig};
pub use error::{CoreError, CoreResult};
