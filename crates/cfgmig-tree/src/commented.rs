//! Configuration tree with a per-path comment side-channel
//!
//! Comments live beside the values, keyed by path. Mutations made through
//! [`CommentedConfigTree`] keep the two in step:
//! - removing a value drops the comments at and below its path
//! - moving a value carries its comments to the destination
//! - copying a value copies its comments
//!
//! Mutations made directly on [`CommentedConfigTree::tree_mut`] bypass this;
//! call [`CommentedConfigTree::prune_comments`] afterwards to drop comments
//! whose values are gone.

use indexmap::IndexMap;

use crate::error::TreeError;
use crate::path::ConfigPath;
use crate::tree::ConfigTree;
use crate::value::ConfigValue;

/// A [`ConfigTree`] plus comments keyed by path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentedConfigTree {
    tree: ConfigTree,
    comments: IndexMap<ConfigPath, String>,
}

impl CommentedConfigTree {
    /// Create empty commented tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing tree with no comments
    #[inline]
    #[must_use]
    pub fn from_tree(tree: ConfigTree) -> Self {
        Self {
            tree,
            comments: IndexMap::new(),
        }
    }

    /// Attach a comment, returning self
    ///
    /// # Errors
    /// Returns error if `path` is not a valid non-root path
    pub fn with_comment(mut self, path: &str, comment: impl Into<String>) -> Result<Self, TreeError> {
        self.set_comment(path, comment)?;
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Direct access to the underlying tree (comments are not kept in step)
    #[inline]
    pub fn tree_mut(&mut self) -> &mut ConfigTree {
        &mut self.tree
    }

    #[inline]
    #[must_use]
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// Split into tree and comments
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (ConfigTree, IndexMap<ConfigPath, String>) {
        (self.tree, self.comments)
    }

    /// Comment attached to a path
    #[must_use]
    pub fn comment(&self, path: &str) -> Option<&str> {
        let path = ConfigPath::parse(path).ok()?;
        self.comment_at(&path)
    }

    #[must_use]
    pub fn comment_at(&self, path: &ConfigPath) -> Option<&str> {
        self.comments.get(path).map(String::as_str)
    }

    /// Attach a comment to a path, independent of whether a value exists there
    ///
    /// # Errors
    /// Returns error if `path` is not a valid non-root path
    pub fn set_comment(&mut self, path: &str, comment: impl Into<String>) -> Result<Option<String>, TreeError> {
        let path = ConfigPath::parse(path)?;
        if path.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        Ok(self.comments.insert(path, comment.into()))
    }

    pub fn remove_comment(&mut self, path: &str) -> Option<String> {
        let path = ConfigPath::parse(path).ok()?;
        self.comments.shift_remove(&path)
    }

    /// All comments in insertion order
    pub fn comments(&self) -> impl Iterator<Item = (&ConfigPath, &str)> {
        self.comments.iter().map(|(p, c)| (p, c.as_str()))
    }

    #[inline]
    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Replace every comment with the given set
    pub fn replace_comments(&mut self, comments: impl IntoIterator<Item = (ConfigPath, String)>) {
        self.comments = comments.into_iter().collect();
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.tree.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.tree.contains(path)
    }

    /// Set a value (see [`ConfigTree::set`])
    ///
    /// # Errors
    /// See [`ConfigTree::set`]
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) -> Result<Option<ConfigValue>, TreeError> {
        self.tree.set(path, value)
    }

    /// Remove a value and every comment at or below its path
    pub fn remove(&mut self, path: &str) -> bool {
        let Ok(path) = ConfigPath::parse(path) else {
            return false;
        };
        let removed = self.tree.take_at(&path).is_some();
        if removed {
            self.comments.retain(|p, _| !path.is_prefix_of(p));
        }
        removed
    }

    /// Move a value and its comments
    ///
    /// # Errors
    /// See [`ConfigTree::move_value`]
    pub fn move_value(&mut self, from: &str, to: &str, overwrite: bool) -> Result<bool, TreeError> {
        let from = ConfigPath::parse(from)?;
        let to = ConfigPath::parse(to)?;
        self.move_at(&from, &to, overwrite)
    }

    fn move_at(&mut self, from: &ConfigPath, to: &ConfigPath, overwrite: bool) -> Result<bool, TreeError> {
        if from == to {
            return self.tree.move_at(from, to, overwrite);
        }
        let moved = self.tree.move_at(from, to, overwrite)?;
        if moved {
            self.comments.retain(|p, _| !to.is_prefix_of(p));
            let carried: Vec<(ConfigPath, String)> = self
                .comments
                .iter()
                .filter_map(|(p, c)| p.rebase(from, to).map(|np| (np, c.clone())))
                .collect();
            self.comments.retain(|p, _| !from.is_prefix_of(p));
            self.comments.extend(carried);
        }
        Ok(moved)
    }

    /// Copy a value and its comments
    ///
    /// # Errors
    /// See [`ConfigTree::copy_value`]
    pub fn copy_value(&mut self, from: &str, to: &str, overwrite: bool) -> Result<bool, TreeError> {
        let from = ConfigPath::parse(from)?;
        let to = ConfigPath::parse(to)?;
        let copied = self.tree.copy_at(&from, &to, overwrite)?;
        if copied && from != to {
            let carried: Vec<(ConfigPath, String)> = self
                .comments
                .iter()
                .filter_map(|(p, c)| p.rebase(&from, &to).map(|np| (np, c.clone())))
                .collect();
            self.comments.retain(|p, _| !to.is_prefix_of(p) || from.is_prefix_of(p));
            self.comments.extend(carried);
        }
        Ok(copied)
    }

    /// Wrap a value (see [`ConfigTree::wrap_value`]); its comment stays on the wrapper
    ///
    /// # Errors
    /// See [`ConfigTree::wrap_value`]
    pub fn wrap_value(&mut self, path: &str, inner_key: &str) -> Result<bool, TreeError> {
        self.tree.wrap_value(path, inner_key)
    }

    /// Rename a top-level key, carrying comments
    ///
    /// # Errors
    /// See [`ConfigTree::move_value`]
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> Result<bool, TreeError> {
        self.move_at(&ConfigPath::single(old_key), &ConfigPath::single(new_key), true)
    }

    /// Rename a key inside `parent`, carrying comments
    ///
    /// # Errors
    /// See [`ConfigTree::move_value`]
    pub fn rename_in(&mut self, parent: &str, old_key: &str, new_key: &str) -> Result<bool, TreeError> {
        let parent = ConfigPath::parse(parent)?;
        self.move_at(&parent.child(old_key), &parent.child(new_key), true)
    }

    /// Drop comments whose path no longer holds a value
    ///
    /// Returns the number of comments dropped.
    pub fn prune_comments(&mut self) -> usize {
        let before = self.comments.len();
        let tree = &self.tree;
        self.comments.retain(|p, _| tree.contains_at(p));
        before - self.comments.len()
    }
}

impl From<ConfigTree> for CommentedConfigTree {
    fn from(tree: ConfigTree) -> Self {
        Self::from_tree(tree)
    }
}
