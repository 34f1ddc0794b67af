//! Integration tests for settings resolution across sources.
//!
//! These tests drive the public API end to end: documents loaded from disk,
//! overrides from assignments and the environment, and both manager modes.

use serde::Deserialize;
use serde_json::json;
use serial_test::serial;
use settings_manager::source::{ConfigFormat, parse_str};
use settings_manager::{
    ConfigMap, DEFAULT_KEY, OverrideLayer, SerdeFactory, SettingsError, SettingsManager, load_file,
};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
struct AppSettings {
    name: String,
    value: i64,
    database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
struct DatabaseSettings {
    host: String,
    port: u16,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            value: 0,
            database: DatabaseSettings::default(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

fn factory() -> SerdeFactory<AppSettings> {
    SerdeFactory::new()
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// File values, then assignments: assignments win, siblings survive.
#[test]
fn test_single_mode_file_then_cli_overrides() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "app.toml",
        "name = \"from_file\"\nvalue = 42\n\n[database]\nhost = \"db.internal\"\n",
    );

    let mut manager = SettingsManager::new(factory());
    manager.set_user_config(load_file(&path).unwrap()).unwrap();
    manager
        .set_overrides(OverrideLayer::from_assignments(["value=100", "database.port=6543"]).unwrap())
        .unwrap();

    let settings = manager.current_settings().unwrap();
    assert_eq!(settings.name, "from_file");
    assert_eq!(settings.value, 100);
    assert_eq!(settings.database.host, "db.internal");
    assert_eq!(settings.database.port, 6543);
}

#[test]
#[serial]
fn test_single_mode_environment_overrides() {
    temp_env::with_vars(
        [
            ("INTEGRATION_APP__VALUE", Some("7")),
            ("INTEGRATION_APP__DATABASE__HOST", Some("env-host")),
        ],
        || {
            let mut manager = SettingsManager::new(factory());
            manager
                .set_user_config(parse_str(ConfigFormat::Json, r#"{"value": 1}"#).unwrap())
                .unwrap();
            manager
                .set_overrides(OverrideLayer::from_env("INTEGRATION_APP"))
                .unwrap();

            let settings = manager.current_settings().unwrap();
            assert_eq!(settings.value, 7);
            assert_eq!(settings.database.host, "env-host");
            assert_eq!(settings.database.port, 5432);
        },
    );
}

#[test]
fn test_multi_mode_from_yaml_document() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "environments.yaml",
        "dev:\n  name: development\n  value: 42\nprod:\n  name: production\n  value: 100\n  database:\n    host: prod-db\n",
    );

    let mut manager = SettingsManager::multi(factory());
    manager.set_user_config(load_file(&path).unwrap()).unwrap();

    assert_eq!(manager.current_settings().unwrap().name, "development");

    manager.set_active_key("prod").unwrap();
    let prod = manager.current_settings().unwrap();
    assert_eq!(prod.name, "production");
    assert_eq!(prod.value, 100);
    assert_eq!(prod.database.host, "prod-db");

    assert_eq!(manager.all_keys().unwrap(), vec!["dev", "prod"]);
}

#[test]
fn test_multi_mode_individual_entry_after_choosing_key() {
    let mut manager = SettingsManager::multi(factory());
    let bulk = parse_str(
        ConfigFormat::Json,
        r#"{"dev": {"value": 1}, "prod": {"value": 2}}"#,
    )
    .unwrap();
    manager.set_user_config(bulk).unwrap();
    manager.set_active_key("prod").unwrap();

    let entry = parse_str(ConfigFormat::Json, r#"{"name": "patched", "value": 3}"#).unwrap();
    manager.set_user_config(entry).unwrap();

    assert_eq!(manager.current_settings().unwrap().value, 3);
    assert_eq!(manager.get_by_key("dev").unwrap().value, 1);
}

#[test]
fn test_raw_config_unwritten_key_even_with_defaults() {
    let mut manager = SettingsManager::new(factory());

    assert_eq!(manager.current_settings().unwrap(), &AppSettings::default());
    let err = manager.raw_config_by_key(DEFAULT_KEY).unwrap_err();
    assert!(err.is_key_not_found());
}

#[test]
fn test_validation_error_exposes_schema_error() {
    let mut manager = SettingsManager::new(factory());
    let mut config = ConfigMap::new();
    config.insert("database".to_string(), json!({"port": "not-a-port"}));
    manager.set_user_config(config).unwrap();

    let err = manager.current_settings().unwrap_err();
    assert!(matches!(err, SettingsError::Validation { .. }));
    let message = err.validation_source().unwrap().to_string();
    assert!(message.contains("invalid type"), "unexpected message: {message}");
}

#[test]
fn test_manager_behind_mutex() {
    use std::sync::{Arc, Mutex};

    let manager = Arc::new(Mutex::new(SettingsManager::multi(factory())));
    manager
        .lock()
        .unwrap()
        .set_user_config(
            parse_str(ConfigFormat::Json, r#"{"a": {"value": 1}, "b": {"value": 2}}"#).unwrap(),
        )
        .unwrap();

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|key| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                let mut guard = manager.lock().unwrap();
                guard.get_by_key(key).unwrap().value
            })
        })
        .collect();

    let mut values: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    values.sort();
    assert_eq!(values, vec![1, 2]);
}
