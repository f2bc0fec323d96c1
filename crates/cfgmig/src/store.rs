//! File-level load / migrate / save

use std::io::Write;
use std::path::Path;

use cfgmig_core::{ConfigSchema, MigrationManager, MigrationResult};
use cfgmig_format::{bind, unbind, ConfigFormat, FormatRegistry};
use cfgmig_tree::{CommentedConfigTree, ConfigPath, MergeStrategy};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// Reads, migrates and writes configuration files
///
/// The codec is picked from the file extension; the migration engine
/// decides whether the loaded tree needs to change.
#[derive(Debug, Default)]
pub struct ConfigStore {
    formats: FormatRegistry,
    manager: MigrationManager,
}

impl ConfigStore {
    /// Store with the default codecs
    #[must_use]
    pub fn new(manager: MigrationManager) -> Self {
        Self {
            formats: FormatRegistry::with_defaults(),
            manager,
        }
    }

    /// With codec registry
    #[inline]
    #[must_use]
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    #[inline]
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    #[inline]
    pub fn manager_mut(&mut self) -> &mut MigrationManager {
        &mut self.manager
    }

    #[inline]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Codec for `path`
    ///
    /// # Errors
    /// Returns [`StoreError::NoCodec`] for unknown extensions
    pub fn codec_for(&self, path: &Path) -> StoreResult<&dyn ConfigFormat> {
        self.formats
            .find_for_path(path)
            .ok_or_else(|| StoreError::NoCodec(path.to_path_buf()))
    }

    /// Load a file, migrating it to the schema's target version
    ///
    /// A missing file is created from the schema defaults and reported as
    /// not migrated. A migrated tree is written back, with the schema header,
    /// before it is bound to `T`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on I/O, codec, binding or migration failure.
    /// A failed migration leaves the file untouched.
    pub fn load_with_migration<T: DeserializeOwned>(
        &self,
        path: &Path,
        schema: &ConfigSchema,
        strategy: Option<MergeStrategy>,
    ) -> StoreResult<MigrationResult<T>> {
        let result = self.migrate_file(path, schema, strategy)?;
        result.try_map(|tree| bind(tree.tree()).map_err(|e| StoreError::format(path, e)))
    }

    /// Tree-level variant of [`ConfigStore::load_with_migration`]
    ///
    /// # Errors
    /// Same as [`ConfigStore::load_with_migration`], minus binding.
    pub fn migrate_file(
        &self,
        path: &Path,
        schema: &ConfigSchema,
        strategy: Option<MergeStrategy>,
    ) -> StoreResult<MigrationResult> {
        if !path.exists() {
            let mut tree = schema.defaults().clone();
            schema.stamp_version(tree.tree_mut(), schema.target_version())?;
            tracing::info!(
                "Creating {} from {} defaults at version {}",
                path.display(),
                schema.config_type(),
                schema.target_version()
            );
            self.write_tree(path, &tree, schema.header())?;
            return Ok(MigrationResult::created(tree, schema.target_version().clone()));
        }

        let tree = self.load_tree(path)?;
        let result = self.manager.migrate(tree, schema, strategy, Some(path))?;
        if result.was_migrated() {
            self.write_tree(path, result.value(), schema.header())?;
        }
        Ok(result)
    }

    /// Write a typed value, with schema header and default comments
    ///
    /// # Errors
    /// Returns [`StoreError`] on binding, codec or I/O failure.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T, schema: &ConfigSchema) -> StoreResult<()> {
        let tree = unbind(value).map_err(|e| StoreError::format(path, e))?;
        let comments: Vec<(ConfigPath, String)> = schema
            .defaults()
            .comments()
            .filter(|(at, _)| tree.contains_at(at))
            .map(|(at, text)| (at.clone(), text.to_string()))
            .collect();

        let mut doc = CommentedConfigTree::from_tree(tree);
        doc.replace_comments(comments);
        self.write_tree(path, &doc, schema.header())
    }

    /// Read and bind a file as-is
    ///
    /// # Errors
    /// Returns [`StoreError`] on I/O, codec or binding failure.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<T> {
        let tree = self.load_tree(path)?;
        bind(tree.tree()).map_err(|e| StoreError::format(path, e))
    }

    /// Read and decode a file
    ///
    /// # Errors
    /// Returns [`StoreError`] on I/O or codec failure.
    pub fn load_tree(&self, path: &Path) -> StoreResult<CommentedConfigTree> {
        let codec = self.codec_for(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        codec.decode(&text).map_err(|e| StoreError::format(path, e))
    }

    /// Encode and atomically replace a file
    ///
    /// # Errors
    /// Returns [`StoreError`] on codec or I/O failure. The previous file
    /// contents survive a failed write.
    pub fn write_tree(&self, path: &Path, tree: &CommentedConfigTree, header: Option<&str>) -> StoreResult<()> {
        let codec = self.codec_for(path)?;
        let text = codec.encode(tree, header).map_err(|e| StoreError::format(path, e))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| StoreError::io(file.path(), e))?;
        file.persist(path).map_err(|e| StoreError::io(path, e.error))?;
        tracing::debug!("Wrote {} ({})", path.display(), codec.name());
        Ok(())
    }
}
