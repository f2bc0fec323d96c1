//! Testing utilities for the cfgmig workspace
//!
//! Shared fixtures: sample trees, steps, schemas and config files on disk.

#![allow(missing_docs)]

use std::path::PathBuf;

use cfgmig_core::{ConfigSchema, MigrationStep};
use cfgmig_format::{ConfigFormat, JsonFormat};
use cfgmig_tree::{CommentedConfigTree, ConfigValue};
use tempfile::TempDir;

pub const TEST_CONFIG_TYPE: &str = "test-app";

pub fn tree_from(entries: &[(&str, ConfigValue)]) -> CommentedConfigTree {
    let mut tree = CommentedConfigTree::new();
    for (path, value) in entries {
        tree.set(path, value.clone()).unwrap();
    }
    tree
}

/// `{version:1, name:"userValue", value:99, deprecatedField:"oldData"}`
pub fn loaded_v1() -> CommentedConfigTree {
    tree_from(&[
        ("version", 1.into()),
        ("name", "userValue".into()),
        ("value", 99.into()),
        ("deprecatedField", "oldData".into()),
    ])
}

/// `{version:2, name:"default", value:10, newField:"newValue"}`
pub fn defaults_v2() -> CommentedConfigTree {
    tree_from(&[
        ("version", 2.into()),
        ("name", "default".into()),
        ("value", 10.into()),
        ("newField", "newValue".into()),
    ])
}

pub fn schema_with(target: &str, defaults: CommentedConfigTree) -> ConfigSchema {
    ConfigSchema::new(TEST_CONFIG_TYPE, target, defaults)
}

pub fn schema_v2() -> ConfigSchema {
    schema_with("2", defaults_v2())
}

pub fn set_value_step(from: &str, to: &str, path: &'static str, value: ConfigValue) -> MigrationStep {
    MigrationStep::plain(from, to, move |tree| {
        tree.set(path, value.clone())?;
        Ok(())
    })
    .with_description(format!("set {path}"))
}

/// v1 -> v2 sets `value=42`, v2 -> v3 sets `flag=true`
pub fn two_step_chain() -> Vec<MigrationStep> {
    vec![
        set_value_step("1", "2", "value", 42.into()),
        set_value_step("2", "3", "flag", true.into()),
    ]
}

pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn write_json(dir: &TempDir, name: &str, tree: &CommentedConfigTree) -> PathBuf {
    let text = JsonFormat.encode(tree, None).unwrap();
    write_file(dir, name, &text)
}

pub fn read_json(path: &std::path::Path) -> CommentedConfigTree {
    JsonFormat.decode(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn backup_files(dir: &TempDir) -> Vec<PathBuf> {
    let backups = dir.path().join("backups");
    if !backups.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(backups)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files
}
