//! Whole-file migrations through `ConfigStore`

use cfgmig::{
    BackupManager, ConfigStore, MergeStrategy, MigrationError, MigrationManager, MissingStepPolicy,
    StoreError,
};
use cfgmig_test_utils::{
    backup_files, defaults_v2, loaded_v1, read_json, schema_v2, schema_with, set_value_step,
    tree_from, two_step_chain, write_json, TEST_CONFIG_TYPE,
};
use cfgmig_tree::{CommentedConfigTree, ConfigValue};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct AppConfig {
    version: i64,
    name: String,
    value: i64,
    #[serde(rename = "newField")]
    new_field: Option<String>,
}

fn store() -> ConfigStore {
    ConfigStore::new(MigrationManager::new())
}

#[test]
fn merge_missing_only_keeps_user_values() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());

    let result = store()
        .migrate_file(&path, &schema_v2(), Some(MergeStrategy::MergeMissingOnly))
        .unwrap();
    assert!(result.was_migrated());
    assert!(result.has_backup());

    let expected = tree_from(&[
        ("version", 2.into()),
        ("name", "userValue".into()),
        ("value", 99.into()),
        ("deprecatedField", "oldData".into()),
        ("newField", "newValue".into()),
    ]);
    assert_eq!(read_json(&path).tree(), expected.tree());
    assert_eq!(backup_files(&dir).len(), 1);
}

#[test]
fn override_resets_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());

    let result = store()
        .migrate_file(&path, &schema_v2(), Some(MergeStrategy::Override))
        .unwrap();
    assert_eq!(result.value().tree(), defaults_v2().tree());
    assert_eq!(read_json(&path).tree(), defaults_v2().tree());
}

#[test]
fn version_only_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());

    let result = store()
        .migrate_file(&path, &schema_v2(), Some(MergeStrategy::VersionOnly))
        .unwrap();
    let tree = result.value();
    assert_eq!(tree.get("version"), Some(&ConfigValue::Integer(2)));
    assert_eq!(tree.get("name"), Some(&ConfigValue::from("userValue")));
    assert_eq!(tree.get("value"), Some(&ConfigValue::Integer(99)));
    assert!(!tree.contains("newField"));
    assert_eq!(tree.get("deprecatedField"), Some(&ConfigValue::from("oldData")));
}

#[test]
fn null_field_is_filled_from_defaults() {
    let dir = TempDir::new().unwrap();
    let mut loaded = loaded_v1();
    loaded.set("name", ConfigValue::Null).unwrap();
    let path = write_json(&dir, "app.json", &loaded);

    let result = store()
        .load_with_migration::<AppConfig>(&path, &schema_v2(), Some(MergeStrategy::MergeMissingOnly))
        .unwrap();
    assert_eq!(result.value().name, "default");
    assert_eq!(read_json(&path).get("name"), Some(&ConfigValue::from("default")));
}

#[test]
fn type_without_steps_migrates_under_fail_policy() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());

    let store = store();
    assert_eq!(store.manager().policy(), MissingStepPolicy::Fail);
    assert!(store.manager().registry().is_empty());

    let result = store.migrate_file(&path, &schema_v2(), None).unwrap();
    assert!(result.was_migrated());
    assert!(result.chain_complete());
    assert_eq!(result.steps_applied(), 0);
    assert_eq!(read_json(&path).get("version"), Some(&ConfigValue::Integer(2)));
    assert_eq!(backup_files(&dir).len(), 1);
}

#[test]
fn same_version_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let mut current = loaded_v1();
    current.set("version", 2).unwrap();
    let path = write_json(&dir, "app.json", &current);
    let before = std::fs::read_to_string(&path).unwrap();

    let result = store().migrate_file(&path, &schema_v2(), None).unwrap();
    assert!(!result.was_migrated());
    assert!(!result.has_backup());
    assert_eq!(result.value().tree(), current.tree());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert!(backup_files(&dir).is_empty());
}

#[test]
fn two_step_chain_reaches_target() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());
    let mut defaults = defaults_v2();
    defaults.set("version", 3).unwrap();

    let mut store = store();
    store
        .manager_mut()
        .register_steps(TEST_CONFIG_TYPE, two_step_chain())
        .unwrap();

    let result = store
        .migrate_file(&path, &schema_with("3", defaults), Some(MergeStrategy::VersionOnly))
        .unwrap();
    assert_eq!(result.steps_applied(), 2);

    let on_disk = read_json(&path);
    assert_eq!(on_disk.get("value"), Some(&ConfigValue::Integer(42)));
    assert_eq!(on_disk.get("flag"), Some(&ConfigValue::Bool(true)));
    assert_eq!(on_disk.get("version"), Some(&ConfigValue::Integer(3)));
}

#[test]
fn missing_step_fail_versus_skip() {
    let mut defaults = defaults_v2();
    defaults.set("version", 3).unwrap();
    let schema = schema_with("3", defaults);

    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());
    let before = std::fs::read_to_string(&path).unwrap();

    let mut failing = store();
    failing
        .manager_mut()
        .register_steps(TEST_CONFIG_TYPE, [set_value_step("1", "2", "value", 42.into())])
        .unwrap();
    let err = failing.migrate_file(&path, &schema, None).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Migration(MigrationError::IncompleteMigrationChain { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

    let mut skipping = ConfigStore::new(MigrationManager::new().with_policy(MissingStepPolicy::Skip));
    skipping
        .manager_mut()
        .register_steps(TEST_CONFIG_TYPE, [set_value_step("1", "2", "value", 42.into())])
        .unwrap();
    let result = skipping
        .migrate_file(&path, &schema, Some(MergeStrategy::VersionOnly))
        .unwrap();
    assert!(result.was_migrated());
    assert!(!result.chain_complete());
    assert_eq!(result.value().get("version"), Some(&ConfigValue::Integer(3)));
    assert_eq!(result.value().get("value"), Some(&ConfigValue::Integer(42)));
}

#[test]
fn load_with_migration_binds_typed_value() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());

    let result = store()
        .load_with_migration::<AppConfig>(&path, &schema_v2(), None)
        .unwrap();
    assert_eq!(
        result.value(),
        &AppConfig {
            version: 2,
            name: "userValue".into(),
            value: 99,
            new_field: Some("newValue".into()),
        }
    );
    assert_eq!(result.old_version().map(|v| v.as_str()), Some("1"));
}

#[test]
fn first_run_writes_defaults_without_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.json");

    let result = store()
        .load_with_migration::<AppConfig>(&path, &schema_v2(), None)
        .unwrap();
    assert!(!result.was_migrated());
    assert!(!result.has_backup());
    assert_eq!(result.value().name, "default");
    assert_eq!(read_json(&path).tree(), defaults_v2().tree());
    assert!(backup_files(&dir).is_empty());
}

#[test]
fn save_then_load_round_trips_with_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.yaml");
    let mut defaults = defaults_v2();
    defaults.set_comment("name", "Display name").unwrap();
    let schema = schema_with("2", defaults).with_header("Test application");

    let config = AppConfig {
        version: 2,
        name: "saved".into(),
        value: 7,
        new_field: None,
    };
    let store = store();
    store.save(&path, &config, &schema).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# Test application\n\n"), "{text}");
    assert!(text.contains("# Display name\nname: saved\n"), "{text}");
    assert_eq!(store.load::<AppConfig>(&path).unwrap(), config);
}

#[test]
fn failed_backup_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());
    let before = std::fs::read_to_string(&path).unwrap();
    let blocker = dir.path().join("blocked");
    std::fs::write(&blocker, "").unwrap();

    let store = ConfigStore::new(MigrationManager::new().with_backups(BackupManager::in_directory(&blocker)));
    let err = store.migrate_file(&path, &schema_v2(), None).unwrap_err();
    assert!(matches!(err, StoreError::Migration(MigrationError::BackupFailed { .. })));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn restore_brings_back_original() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "app.json", &loaded_v1());
    let original = std::fs::read_to_string(&path).unwrap();

    let store = store();
    let result = store
        .migrate_file(&path, &schema_v2(), Some(MergeStrategy::Override))
        .unwrap();
    assert_ne!(std::fs::read_to_string(&path).unwrap(), original);

    let backup = result.backup_path().unwrap();
    store.manager().backups().restore(backup, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    let restored: CommentedConfigTree = read_json(&path);
    assert_eq!(restored.get("deprecatedField"), Some(&ConfigValue::from("oldData")));
}
