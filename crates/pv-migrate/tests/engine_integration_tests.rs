//! Integration tests for the migration engine against the built-in
//! Postervote catalog and on-disk DuckDB databases.

use pv_core::Config;
use pv_migrate::{
    ChangeCatalog, ChangeState, MigrateError, MigrationConfig, MigrationEngine, Outcome,
};
use std::path::Path;

// ── Helpers ────────────────────────────────────────────────────────────

fn file_config(path: &Path) -> MigrationConfig {
    let config = Config::default();
    MigrationConfig::from_config(&config, None)
        .unwrap()
        .with_database_path(path.display().to_string())
}

fn memory_engine() -> MigrationEngine {
    let config: Config = serde_yaml::from_str(
        r#"
targets:
  testing:
    database:
      path: ":memory:"
"#,
    )
    .unwrap();
    let migration_config = MigrationConfig::from_config(&config, Some("testing")).unwrap();
    MigrationEngine::open(&migration_config, ChangeCatalog::builtin().unwrap()).unwrap()
}

fn ledger_names(engine: &MigrationEngine) -> Vec<String> {
    engine
        .status()
        .unwrap()
        .into_iter()
        .filter(|s| s.state == ChangeState::Applied)
        .map(|s| s.name)
        .collect()
}

// ── Built-in catalog ───────────────────────────────────────────────────

#[test]
fn test_builtin_sync_creates_poster_schema() {
    let engine = memory_engine();
    let report = engine.sync().unwrap();
    assert!(report.is_success());
    assert_eq!(report.count(Outcome::Applied), 5);
    assert_eq!(
        engine.current_version().unwrap().as_deref(),
        Some("005_add_devices_label")
    );

    let conn = engine.db().conn();
    conn.execute(
        "INSERT INTO posters (question, colour) VALUES ('Best biscuit?', 'blue')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO poster_options (\"text\", \"value\", poster_id) VALUES ('Hobnob', 1, 1)",
        [],
    )
    .unwrap();
    conn.execute("INSERT INTO devices (\"uuid\", label) VALUES (42, 'lobby')", [])
        .unwrap();

    let id: i32 = conn
        .query_row("SELECT id FROM posters", [], |row| row.get(0))
        .unwrap();
    assert_eq!(id, 1);
    let label: String = conn
        .query_row("SELECT label FROM devices WHERE \"uuid\" = 42", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(label, "lobby");
}

#[test]
fn test_builtin_round_trip() {
    let engine = memory_engine();
    engine.sync().unwrap();
    let report = engine.reset().unwrap();
    assert!(report.is_success());
    assert_eq!(
        report.names_with(Outcome::Reverted),
        vec![
            "005_add_devices_label",
            "004_add_device_counts",
            "003_add_devices",
            "002_add_poster_options",
            "001_add_posters",
        ]
    );
    assert_eq!(engine.current_version().unwrap(), None);
    for table in ["posters", "poster_options", "devices", "device_poster", "device_counts"] {
        assert!(!engine.db().table_exists(table).unwrap(), "{table} left behind");
    }
}

#[test]
fn test_builtin_regenerate_twice() {
    let engine = memory_engine();
    engine.regenerate().into_result().unwrap();
    let report = engine.regenerate().into_result().unwrap();
    assert!(report.is_success());
    assert_eq!(report.count(Outcome::Reverted), 5);
    assert_eq!(report.count(Outcome::Applied), 5);
    assert_eq!(
        ledger_names(&engine),
        ChangeCatalog::builtin().unwrap()
            .names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn test_ledger_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("postervote.duckdb");
    let config = file_config(&path);

    {
        let engine = MigrationEngine::open(&config, ChangeCatalog::builtin().unwrap()).unwrap();
        assert_eq!(engine.sync().unwrap().count(Outcome::Applied), 5);
    }

    let engine = MigrationEngine::open(&config, ChangeCatalog::builtin().unwrap()).unwrap();
    assert_eq!(
        engine.current_version().unwrap().as_deref(),
        Some("005_add_devices_label")
    );
    assert!(engine.sync().unwrap().is_empty());
    assert!(engine.db().table_exists("device_counts").unwrap());
}

#[test]
fn test_older_binary_sees_drift() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("postervote.duckdb");
    let config = file_config(&path);

    {
        let engine = MigrationEngine::open(&config, ChangeCatalog::builtin().unwrap()).unwrap();
        engine.sync().unwrap();
    }

    // A binary that only knows the first three changes
    let older =
        ChangeCatalog::new(ChangeCatalog::builtin().unwrap().changes()[..3].iter().copied()).unwrap();
    let engine = MigrationEngine::open(&config, older).unwrap();

    let err = engine.sync().unwrap_err();
    assert!(matches!(err, MigrateError::DriftError { ref name } if name == "005_add_devices_label"));

    let report = engine.reset().unwrap();
    assert_eq!(
        report.names_with(Outcome::Drift),
        vec!["005_add_devices_label", "004_add_device_counts"]
    );
    assert_eq!(report.count(Outcome::Reverted), 3);
}

#[test]
fn test_custom_ledger_table() {
    let config: Config = serde_yaml::from_str(
        r#"
database:
  path: ":memory:"
migrations:
  table: schema_changes
"#,
    )
    .unwrap();
    let migration_config = MigrationConfig::from_config(&config, None).unwrap();
    let engine = MigrationEngine::open(&migration_config, ChangeCatalog::builtin().unwrap()).unwrap();
    engine.sync().unwrap();
    assert!(engine.db().table_exists("schema_changes").unwrap());
    assert!(!engine.db().table_exists("_migrations").unwrap());
}

#[test]
fn test_invalid_ledger_table_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.duckdb");
    let config = MigrationConfig {
        ledger_table: "bad table".to_string(),
        ..file_config(&path)
    };
    let err = MigrationEngine::open(&config, ChangeCatalog::builtin().unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, MigrateError::SetupError(_)));
    assert!(!path.exists());
}

#[test]
fn test_unknown_target() {
    let err = MigrationConfig::from_config(&Config::default(), Some("production")).unwrap_err();
    assert!(err.to_string().contains("Target 'production' not found"));
}
