use super::*;
use serial_test::serial;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("name: test_project").unwrap();
    assert_eq!(config.name, "test_project");
    assert_eq!(config.database.path, "postervote.duckdb");
    assert_eq!(config.migrations.table, "_migrations");
    assert!(config.targets.is_empty());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: postervote
database:
  path: "./data/postervote.duckdb"
migrations:
  table: schema_changes
targets:
  testing:
    database:
      path: ":memory:"
  production:
    database:
      path: "/var/lib/postervote/prod.duckdb"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.database.path, "./data/postervote.duckdb");
    assert_eq!(config.migrations.table, "schema_changes");
    assert_eq!(config.available_targets(), vec!["production", "testing"]);
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("name: x\nmodel_paths: [models]");
    assert!(result.is_err());
}

#[test]
fn test_validate_empty_name() {
    let config = Config {
        name: String::new(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_validate_empty_database_path() {
    let mut config = Config::default();
    config.database.path = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_target_database_path() {
    let yaml = r#"
targets:
  broken:
    database:
      path: ""
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("targets.broken"));
}

#[test]
fn test_validate_bad_ledger_table() {
    let mut config = Config::default();
    config.migrations.table = "drop table; --".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("not a valid identifier"));
}

#[test]
fn test_is_valid_identifier() {
    assert!(is_valid_identifier("_migrations"));
    assert!(is_valid_identifier("schema_changes2"));
    assert!(!is_valid_identifier(""));
    assert!(!is_valid_identifier("2fast"));
    assert!(!is_valid_identifier("with space"));
    assert!(!is_valid_identifier("quote\"d"));
}

#[test]
fn test_get_database_config_no_target() {
    let config = Config::default();
    let db = config.get_database_config(None).unwrap();
    assert_eq!(db.path, "postervote.duckdb");
    assert!(!db.is_memory());
}

#[test]
fn test_get_database_config_with_target() {
    let yaml = r#"
database:
  path: dev.duckdb
targets:
  testing:
    database:
      path: ":memory:"
  staging: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let testing = config.get_database_config(Some("testing")).unwrap();
    assert!(testing.is_memory());

    // A target without a database override falls back to the base config
    let staging = config.get_database_config(Some("staging")).unwrap();
    assert_eq!(staging.path, "dev.duckdb");
}

#[test]
fn test_get_database_config_unknown_target() {
    let yaml = r#"
targets:
  testing:
    database:
      path: ":memory:"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.get_database_config(Some("prod")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Target 'prod' not found"));
    assert!(msg.contains("testing"));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("postervote.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("postervote.yaml"),
        "name: from_yaml\ndatabase:\n  path: x.duckdb\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "from_yaml");
    assert_eq!(config.database.path, "x.duckdb");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load_from_dir(dir.path()).is_err());
}

#[test]
fn test_load_from_dir_or_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_dir_or_default(dir.path()).unwrap();
    assert_eq!(config.name, "postervote");
    assert_eq!(config.migrations.table, "_migrations");
}

#[test]
fn test_load_invalid_yaml() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("postervote.yml"), "name: [unclosed").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
#[serial]
fn test_resolve_target_cli_flag_wins() {
    std::env::set_var(TARGET_ENV_VAR, "production");
    assert_eq!(
        Config::resolve_target(Some("testing")),
        Some("testing".to_string())
    );
    std::env::remove_var(TARGET_ENV_VAR);
}

#[test]
#[serial]
fn test_resolve_target_from_env() {
    std::env::set_var(TARGET_ENV_VAR, "production");
    assert_eq!(Config::resolve_target(None), Some("production".to_string()));
    std::env::remove_var(TARGET_ENV_VAR);
    assert_eq!(Config::resolve_target(None), None);
}
