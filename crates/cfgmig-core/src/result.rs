//! Outcome of a migration run

use std::path::{Path, PathBuf};

use cfgmig_tree::CommentedConfigTree;

use crate::version::MigrationVersion;

/// Immutable record of what a migration run did
///
/// `T` is the migrated tree by default; [`MigrationResult::try_map`] turns
/// it into a typed value once the tree has been bound.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationResult<T = CommentedConfigTree> {
    value: T,
    migrated: bool,
    old_version: Option<MigrationVersion>,
    new_version: Option<MigrationVersion>,
    backup_path: Option<PathBuf>,
    steps_applied: usize,
    chain_complete: bool,
}

impl<T> MigrationResult<T> {
    /// Loaded version already matched the target
    #[must_use]
    pub fn unchanged(value: T, version: MigrationVersion) -> Self {
        Self {
            value,
            migrated: false,
            old_version: Some(version.clone()),
            new_version: Some(version),
            backup_path: None,
            steps_applied: 0,
            chain_complete: true,
        }
    }

    /// Value was freshly created from defaults (no file existed)
    #[must_use]
    pub fn created(value: T, version: MigrationVersion) -> Self {
        Self {
            value,
            migrated: false,
            old_version: None,
            new_version: Some(version),
            backup_path: None,
            steps_applied: 0,
            chain_complete: true,
        }
    }

    /// Migration ran from `old_version` to `new_version`
    #[must_use]
    pub fn migrated(
        value: T,
        old_version: MigrationVersion,
        new_version: MigrationVersion,
        backup_path: Option<PathBuf>,
        steps_applied: usize,
        chain_complete: bool,
    ) -> Self {
        Self {
            value,
            migrated: true,
            old_version: Some(old_version),
            new_version: Some(new_version),
            backup_path,
            steps_applied,
            chain_complete,
        }
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn was_migrated(&self) -> bool {
        self.migrated
    }

    /// Version found in the loaded data (`None` for freshly created files)
    #[inline]
    #[must_use]
    pub fn old_version(&self) -> Option<&MigrationVersion> {
        self.old_version.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn new_version(&self) -> Option<&MigrationVersion> {
        self.new_version.as_ref()
    }

    /// Backup written before mutation, if any
    #[inline]
    #[must_use]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup_path.is_some()
    }

    #[inline]
    #[must_use]
    pub fn steps_applied(&self) -> usize {
        self.steps_applied
    }

    /// False when a partial chain was applied under the skip policy
    #[inline]
    #[must_use]
    pub fn chain_complete(&self) -> bool {
        self.chain_complete
    }

    /// Map the carried value, keeping the migration metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MigrationResult<U> {
        MigrationResult {
            value: f(self.value),
            migrated: self.migrated,
            old_version: self.old_version,
            new_version: self.new_version,
            backup_path: self.backup_path,
            steps_applied: self.steps_applied,
            chain_complete: self.chain_complete,
        }
    }

    /// Fallible [`MigrationResult::map`]
    ///
    /// # Errors
    /// Propagates the error returned by `f`
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<MigrationResult<U>, E> {
        Ok(MigrationResult {
            value: f(self.value)?,
            migrated: self.migrated,
            old_version: self.old_version,
            new_version: self.new_version,
            backup_path: self.backup_path,
            steps_applied: self.steps_applied,
            chain_complete: self.chain_complete,
        })
    }
}
