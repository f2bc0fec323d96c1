//! Path-addressable configuration tree
//!
//! [`ConfigTree`] is the format-agnostic representation every migration step
//! operates on. Keys keep their insertion order so a decoded file re-encodes
//! in the order it was written.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::path::ConfigPath;
use crate::value::ConfigValue;

/// Ordered hierarchical key/value store
///
/// # Invariants
/// - Paths split on `.`; every intermediate segment resolves to a nested tree
/// - Writes create missing intermediate trees, never overwrite a scalar parent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree {
    entries: IndexMap<String, ConfigValue>,
}

impl ConfigTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Number of top-level entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Top-level entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert a top-level key verbatim (no path splitting)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Get value at a dotted path
    ///
    /// Missing or unparsable paths yield `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        ConfigPath::parse(path).ok().and_then(|p| self.get_at(&p))
    }

    /// Get value at a parsed path
    #[must_use]
    pub fn get_at(&self, path: &ConfigPath) -> Option<&ConfigValue> {
        let (last, parents) = path.segments().split_last()?;
        self.table_for(parents)?.entries.get(last)
    }

    /// Get mutable value at a dotted path
    pub fn get_mut(&mut self, path: &str) -> Option<&mut ConfigValue> {
        let path = ConfigPath::parse(path).ok()?;
        self.get_at_mut(&path)
    }

    pub fn get_at_mut(&mut self, path: &ConfigPath) -> Option<&mut ConfigValue> {
        let (last, parents) = path.segments().split_last()?;
        self.table_for_mut(parents)?.entries.get_mut(last)
    }

    /// Get the nested tree at a path (root path yields `self`)
    #[must_use]
    pub fn table_at(&self, path: &ConfigPath) -> Option<&ConfigTree> {
        self.table_for(path.segments())
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn contains_at(&self, path: &ConfigPath) -> bool {
        self.get_at(path).is_some()
    }

    /// Set value at a dotted path, creating intermediate trees
    ///
    /// Returns the previous value, if any.
    ///
    /// # Errors
    /// - [`TreeError::TypeConflict`] if an intermediate segment holds a non-tree
    /// - [`TreeError::InvalidPath`] / [`TreeError::EmptyPath`] for bad paths
    pub fn set(
        &mut self,
        path: &str,
        value: impl Into<ConfigValue>,
    ) -> Result<Option<ConfigValue>, TreeError> {
        let path = ConfigPath::parse(path)?;
        self.set_at(&path, value)
    }

    /// Set value at a parsed path
    ///
    /// # Errors
    /// See [`ConfigTree::set`]
    pub fn set_at(
        &mut self,
        path: &ConfigPath,
        value: impl Into<ConfigValue>,
    ) -> Result<Option<ConfigValue>, TreeError> {
        let (last, parents) = path.segments().split_last().ok_or(TreeError::EmptyPath)?;

        let mut table = self;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = table
                .entries
                .entry(segment.clone())
                .or_insert_with(|| ConfigValue::Table(ConfigTree::new()));
            table = match entry {
                ConfigValue::Table(nested) => nested,
                other => {
                    return Err(TreeError::type_conflict(
                        path.to_string(),
                        parents[..=depth].join("."),
                        other.kind(),
                    ))
                }
            };
        }

        Ok(table.entries.insert(last.clone(), value.into()))
    }

    /// Remove value at a dotted path
    ///
    /// Returns whether something was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        self.take(path).is_some()
    }

    /// Remove and return value at a dotted path
    pub fn take(&mut self, path: &str) -> Option<ConfigValue> {
        let path = ConfigPath::parse(path).ok()?;
        self.take_at(&path)
    }

    pub fn take_at(&mut self, path: &ConfigPath) -> Option<ConfigValue> {
        let (last, parents) = path.segments().split_last()?;
        self.table_for_mut(parents)?.entries.shift_remove(last)
    }

    /// Move a value to a new path
    ///
    /// Copies to `to` then removes `from`. When `to` already exists and
    /// `overwrite` is false, nothing changes and `false` is returned.
    ///
    /// # Errors
    /// - [`TreeError::OverlappingPaths`] if one path nests inside the other
    /// - [`TreeError::TypeConflict`] if `to` cannot be created
    pub fn move_value(&mut self, from: &str, to: &str, overwrite: bool) -> Result<bool, TreeError> {
        let from = ConfigPath::parse(from)?;
        let to = ConfigPath::parse(to)?;
        self.move_at(&from, &to, overwrite)
    }

    /// Move a value between parsed paths
    ///
    /// # Errors
    /// See [`ConfigTree::move_value`]
    pub fn move_at(&mut self, from: &ConfigPath, to: &ConfigPath, overwrite: bool) -> Result<bool, TreeError> {
        if from.is_empty() || to.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        let Some(value) = self.get_at(from).cloned() else {
            return Ok(false);
        };
        if from == to {
            // destination is the source itself
            return Ok(overwrite);
        }
        if from.overlaps(to) {
            return Err(TreeError::OverlappingPaths {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if !overwrite && self.contains_at(to) {
            return Ok(false);
        }

        self.set_at(to, value)?;
        self.take_at(from);
        Ok(true)
    }

    /// Copy a value to a new path, keeping the source
    ///
    /// Same overwrite contract as [`ConfigTree::move_value`].
    ///
    /// # Errors
    /// [`TreeError::TypeConflict`] if `to` cannot be created
    pub fn copy_value(&mut self, from: &str, to: &str, overwrite: bool) -> Result<bool, TreeError> {
        let from = ConfigPath::parse(from)?;
        let to = ConfigPath::parse(to)?;
        self.copy_at(&from, &to, overwrite)
    }

    /// Copy a value between parsed paths
    ///
    /// # Errors
    /// See [`ConfigTree::copy_value`]
    pub fn copy_at(&mut self, from: &ConfigPath, to: &ConfigPath, overwrite: bool) -> Result<bool, TreeError> {
        let Some(value) = self.get_at(from).cloned() else {
            return Ok(false);
        };
        if !overwrite && self.contains_at(to) {
            return Ok(false);
        }
        self.set_at(to, value)?;
        Ok(true)
    }

    /// Wrap a non-tree value into a nested tree under `inner_key`
    ///
    /// `server = "main"` becomes `server = { id = "main" }` for
    /// `wrap_value("server", "id")`. Already-wrapped or missing values are
    /// left alone and yield `false`.
    ///
    /// # Errors
    /// [`TreeError::InvalidPath`] / [`TreeError::EmptyPath`] for bad paths
    pub fn wrap_value(&mut self, path: &str, inner_key: &str) -> Result<bool, TreeError> {
        let path = ConfigPath::parse(path)?;
        let inner = ConfigPath::parse(inner_key)?;
        self.wrap_at(&path, &inner)
    }

    /// Wrap the value at a parsed path
    ///
    /// # Errors
    /// See [`ConfigTree::wrap_value`]
    pub fn wrap_at(&mut self, path: &ConfigPath, inner: &ConfigPath) -> Result<bool, TreeError> {
        if inner.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        let Some(slot) = self.get_at_mut(path) else {
            return Ok(false);
        };
        if slot.is_table() {
            return Ok(false);
        }

        let mut wrapper = ConfigTree::new();
        wrapper.set_at(inner, slot.clone())?;
        *slot = ConfigValue::Table(wrapper);
        Ok(true)
    }

    /// Rename a top-level key, replacing any existing value under `new_key`
    ///
    /// # Errors
    /// See [`ConfigTree::move_value`]
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> Result<bool, TreeError> {
        self.move_at(&ConfigPath::single(old_key), &ConfigPath::single(new_key), true)
    }

    /// Rename a key inside the tree at `parent`
    ///
    /// # Errors
    /// See [`ConfigTree::move_value`]
    pub fn rename_in(&mut self, parent: &str, old_key: &str, new_key: &str) -> Result<bool, TreeError> {
        let parent = ConfigPath::parse(parent)?;
        self.move_at(&parent.child(old_key), &parent.child(new_key), true)
    }

    /// Every value path in the tree, depth-first, parents before children
    #[must_use]
    pub fn paths(&self) -> Vec<ConfigPath> {
        let mut out = Vec::new();
        self.collect_paths(&ConfigPath::root(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: &ConfigPath, out: &mut Vec<ConfigPath>) {
        for (key, value) in &self.entries {
            let path = prefix.child(key.clone());
            if let ConfigValue::Table(nested) = value {
                out.push(path.clone());
                nested.collect_paths(&path, out);
            } else {
                out.push(path);
            }
        }
    }

    fn table_for(&self, segments: &[String]) -> Option<&ConfigTree> {
        let mut table = self;
        for segment in segments {
            table = table.entries.get(segment)?.as_table()?;
        }
        Some(table)
    }

    fn table_for_mut(&mut self, segments: &[String]) -> Option<&mut ConfigTree> {
        let mut table = self;
        for segment in segments {
            table = table.entries.get_mut(segment)?.as_table_mut()?;
        }
        Some(table)
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigTree {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<IndexMap<String, ConfigValue>> for ConfigTree {
    fn from(entries: IndexMap<String, ConfigValue>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for ConfigTree {
    type Item = (String, ConfigValue);
    type IntoIter = indexmap::map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> ConfigTree {
        let mut tree = ConfigTree::new();
        tree.set("version", 1).unwrap();
        tree.set("server.host", "localhost").unwrap();
        tree.set("server.port", 8080).unwrap();
        tree.set("name", "app").unwrap();
        tree
    }

    #[test]
    fn set_creates_intermediate_tables() {
        let mut tree = ConfigTree::new();
        tree.set("a.b.c", 1).unwrap();
        assert!(tree.get("a").unwrap().is_table());
        assert!(tree.get("a.b").unwrap().is_table());
        assert_eq!(tree.get("a.b.c"), Some(&ConfigValue::Integer(1)));
    }

    #[test]
    fn set_returns_previous_value() {
        let mut tree = sample();
        let previous = tree.set("name", "other").unwrap();
        assert_eq!(previous, Some(ConfigValue::from("app")));
    }

    #[test]
    fn set_overwrites_subtree() {
        let mut tree = sample();
        tree.set("server", "flat").unwrap();
        assert_eq!(tree.get("server"), Some(&ConfigValue::from("flat")));
        assert!(tree.get("server.port").is_none());
    }

    #[test]
    fn set_through_scalar_is_type_conflict() {
        let mut tree = sample();
        let err = tree.set("name.first", "x").unwrap_err();
        assert!(err.is_type_conflict());
        assert_eq!(
            err,
            TreeError::type_conflict("name.first", "name", "string")
        );
        // nothing changed
        assert_eq!(tree, sample());
    }

    #[test]
    fn set_through_list_is_type_conflict() {
        let mut tree = ConfigTree::new();
        tree.set("items", vec![ConfigValue::from(1)]).unwrap();
        let err = tree.set("items.first", 2).unwrap_err();
        assert!(matches!(err, TreeError::TypeConflict { found: "list", .. }));
    }

    #[test]
    fn set_root_is_rejected() {
        let mut tree = ConfigTree::new();
        assert_eq!(tree.set("", 1).unwrap_err(), TreeError::EmptyPath);
    }

    #[test]
    fn get_missing_and_invalid_paths() {
        let tree = sample();
        assert!(tree.get("missing").is_none());
        assert!(tree.get("server.missing").is_none());
        assert!(tree.get("name.deeper").is_none());
        assert!(tree.get("server..port").is_none());
        assert!(tree.get("").is_none());
    }

    #[test]
    fn remove_reports_whether_removed() {
        let mut tree = sample();
        assert!(tree.remove("server.port"));
        assert!(!tree.remove("server.port"));
        assert!(tree.contains("server.host"));
    }

    #[test]
    fn remove_keeps_key_order() {
        let mut tree = sample();
        tree.remove("server");
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["version", "name"]);
    }

    #[test]
    fn move_respects_overwrite_flag() {
        let mut tree = sample();
        assert!(!tree.move_value("name", "version", false).unwrap());
        assert_eq!(tree, sample());

        assert!(tree.move_value("name", "version", true).unwrap());
        assert_eq!(tree.get("version"), Some(&ConfigValue::from("app")));
        assert!(!tree.contains("name"));
    }

    #[test]
    fn move_missing_source_is_noop() {
        let mut tree = sample();
        assert!(!tree.move_value("nope", "other", true).unwrap());
        assert_eq!(tree, sample());
    }

    #[test]
    fn move_into_new_nested_path() {
        let mut tree = sample();
        assert!(tree.move_value("server.port", "network.listen.port", false).unwrap());
        assert_eq!(tree.get("network.listen.port"), Some(&ConfigValue::Integer(8080)));
        assert!(!tree.contains("server.port"));
    }

    #[test]
    fn move_onto_own_descendant_is_rejected() {
        let mut tree = sample();
        let err = tree.move_value("server", "server.inner", true).unwrap_err();
        assert!(matches!(err, TreeError::OverlappingPaths { .. }));
        assert_eq!(tree, sample());
    }

    #[test]
    fn move_onto_itself() {
        let mut tree = sample();
        assert!(!tree.move_value("name", "name", false).unwrap());
        assert!(tree.move_value("name", "name", true).unwrap());
        assert_eq!(tree, sample());
    }

    #[test]
    fn move_type_conflict_keeps_source() {
        let mut tree = sample();
        let err = tree.move_value("server.port", "name.port", true).unwrap_err();
        assert!(err.is_type_conflict());
        assert_eq!(tree, sample());
    }

    #[test]
    fn copy_keeps_source() {
        let mut tree = sample();
        assert!(tree.copy_value("server", "backup_server", false).unwrap());
        assert_eq!(tree.get("backup_server.port"), Some(&ConfigValue::Integer(8080)));
        assert_eq!(tree.get("server.port"), Some(&ConfigValue::Integer(8080)));
        assert!(!tree.copy_value("server", "backup_server", false).unwrap());
    }

    #[test]
    fn wrap_scalar_into_table() {
        let mut tree = ConfigTree::new();
        tree.set("server", "main").unwrap();
        assert!(tree.wrap_value("server", "id").unwrap());
        assert_eq!(tree.get("server.id"), Some(&ConfigValue::from("main")));
        assert!(!tree.wrap_value("server", "id").unwrap());
        assert!(!tree.wrap_value("missing", "id").unwrap());
    }

    #[test]
    fn wrap_list_value() {
        let mut tree = ConfigTree::new();
        tree.set("hosts", vec![ConfigValue::from("a")]).unwrap();
        assert!(tree.wrap_value("hosts", "entries").unwrap());
        assert!(tree.get("hosts.entries").unwrap().as_list().is_some());
    }

    #[test]
    fn rename_top_level_and_nested() {
        let mut tree = sample();
        assert!(tree.rename("name", "app_name").unwrap());
        assert_eq!(tree.get("app_name"), Some(&ConfigValue::from("app")));

        assert!(tree.rename_in("server", "host", "address").unwrap());
        assert_eq!(tree.get("server.address"), Some(&ConfigValue::from("localhost")));
        assert!(!tree.contains("server.host"));

        // rename overwrites
        assert!(tree.rename("app_name", "version").unwrap());
        assert_eq!(tree.get("version"), Some(&ConfigValue::from("app")));
    }

    #[test]
    fn paths_lists_parents_before_children() {
        let tree = sample();
        let paths: Vec<String> = tree.paths().iter().map(ToString::to_string).collect();
        assert_eq!(
            paths,
            vec!["version", "server", "server.host", "server.port", "name"]
        );
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,6}"
    }

    fn path_text() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..4).prop_map(|segs| segs.join("."))
    }

    proptest! {
        #[test]
        fn prop_set_then_get(path in path_text(), value in any::<i64>()) {
            let mut tree = ConfigTree::new();
            tree.set(&path, value).unwrap();
            prop_assert_eq!(tree.get(&path), Some(&ConfigValue::Integer(value)));
        }

        #[test]
        fn prop_remove_then_get(path in path_text(), value in ".*") {
            let mut tree = ConfigTree::new();
            tree.set(&path, value).unwrap();
            prop_assert!(tree.remove(&path));
            prop_assert!(tree.get(&path).is_none());
        }

        #[test]
        fn prop_wrap_is_idempotent(key in segment(), inner in segment(), value in any::<i64>()) {
            let mut once = ConfigTree::new();
            once.set(&key, value).unwrap();
            let mut twice = once.clone();

            once.wrap_value(&key, &inner).unwrap();
            twice.wrap_value(&key, &inner).unwrap();
            twice.wrap_value(&key, &inner).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_move_without_overwrite_never_clobbers(
            a in segment(),
            b in segment(),
            va in any::<i64>(),
            vb in ".*",
        ) {
            prop_assume!(a != b);
            let mut tree = ConfigTree::new();
            tree.set(&a, va).unwrap();
            tree.set(&b, vb.clone()).unwrap();

            prop_assert!(!tree.move_value(&a, &b, false).unwrap());
            prop_assert_eq!(tree.get(&a), Some(&ConfigValue::Integer(va)));
            prop_assert_eq!(tree.get(&b), Some(&ConfigValue::String(vb)));
        }
    }
}
