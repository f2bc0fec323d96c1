//! Schema descriptor for a migrating configuration
//!
//! A [`ConfigSchema`] tells the manager where the version field lives, which
//! version the application expects, and which defaults to merge against.

use cfgmig_tree::{CommentedConfigTree, ConfigPath, ConfigTree, ConfigValue, TreeError};

use crate::error::MigrationError;
use crate::registry::ConfigType;
use crate::version::MigrationVersion;

/// Default location of the version field
pub const DEFAULT_VERSION_FIELD: &str = "version";

/// Version field holds a value that is not a version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("version field '{path}' holds a {found}, expected a non-negative number or a string")]
pub struct VersionFieldError {
    pub path: String,
    pub found: &'static str,
}

impl From<VersionFieldError> for MigrationError {
    fn from(err: VersionFieldError) -> Self {
        Self::InvalidVersionField {
            path: err.path,
            found: err.found,
        }
    }
}

/// Everything the manager needs to know about one configuration type
#[derive(Debug, Clone)]
pub struct ConfigSchema {
    config_type: ConfigType,
    version_path: ConfigPath,
    target_version: MigrationVersion,
    defaults: CommentedConfigTree,
    assumed_version: Option<MigrationVersion>,
    header: Option<String>,
}

impl ConfigSchema {
    /// Create schema with version field at [`DEFAULT_VERSION_FIELD`]
    #[must_use]
    pub fn new(
        config_type: impl Into<ConfigType>,
        target_version: impl Into<MigrationVersion>,
        defaults: impl Into<CommentedConfigTree>,
    ) -> Self {
        Self {
            config_type: config_type.into(),
            version_path: ConfigPath::single(DEFAULT_VERSION_FIELD),
            target_version: target_version.into(),
            defaults: defaults.into(),
            assumed_version: None,
            header: None,
        }
    }

    /// With version field at a different path
    #[inline]
    #[must_use]
    pub fn with_version_path(mut self, path: ConfigPath) -> Self {
        self.version_path = path;
        self
    }

    /// Treat files without a version field as being at `version`
    #[inline]
    #[must_use]
    pub fn assume_unversioned_as(mut self, version: impl Into<MigrationVersion>) -> Self {
        self.assumed_version = Some(version.into());
        self
    }

    /// With file header written above the encoded tree
    #[inline]
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn config_type(&self) -> &ConfigType {
        &self.config_type
    }

    #[inline]
    #[must_use]
    pub fn version_path(&self) -> &ConfigPath {
        &self.version_path
    }

    #[inline]
    #[must_use]
    pub fn target_version(&self) -> &MigrationVersion {
        &self.target_version
    }

    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &CommentedConfigTree {
        &self.defaults
    }

    #[inline]
    #[must_use]
    pub fn assumed_version(&self) -> Option<&MigrationVersion> {
        self.assumed_version.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Version declared by a loaded tree
    ///
    /// A missing field yields the assumed version, or
    /// [`MigrationVersion::unversioned`] when none is configured.
    ///
    /// # Errors
    /// Returns [`VersionFieldError`] if the field is not a non-negative number or a string
    pub fn read_version(&self, tree: &ConfigTree) -> Result<MigrationVersion, VersionFieldError> {
        match read_version_field(tree, &self.version_path)? {
            Some(version) => Ok(version),
            None => Ok(self
                .assumed_version
                .clone()
                .unwrap_or_else(MigrationVersion::unversioned)),
        }
    }

    /// Write `version` into the version field
    ///
    /// The value type follows the defaults: a string default stays a string,
    /// an integer default stays an integer. Without a default, integer-shaped
    /// versions are written as integers.
    ///
    /// # Errors
    /// Returns [`TreeError`] if the version path collides with a non-table value
    pub fn stamp_version(&self, tree: &mut ConfigTree, version: &MigrationVersion) -> Result<(), TreeError> {
        let value = version_value(self.defaults.tree().get_at(&self.version_path), version);
        tree.set_at(&self.version_path, value)?;
        Ok(())
    }
}

/// Read the version stored at `path`, `None` when absent
///
/// # Errors
/// Returns [`VersionFieldError`] if the field is not a non-negative number or a string
pub fn read_version_field(
    tree: &ConfigTree,
    path: &ConfigPath,
) -> Result<Option<MigrationVersion>, VersionFieldError> {
    let Some(value) = tree.get_at(path) else {
        return Ok(None);
    };
    match value {
        ConfigValue::Integer(n) if *n < 0 => Err(VersionFieldError {
            path: path.to_string(),
            found: "negative integer",
        }),
        ConfigValue::Float(f) if f.is_sign_negative() => Err(VersionFieldError {
            path: path.to_string(),
            found: "negative float",
        }),
        ConfigValue::Integer(n) => Ok(Some(MigrationVersion::parse(n.to_string()))),
        ConfigValue::String(s) => Ok(Some(MigrationVersion::parse(s.as_str()))),
        ConfigValue::Float(f) => Ok(Some(MigrationVersion::parse(f.to_string()))),
        other => Err(VersionFieldError {
            path: path.to_string(),
            found: other.kind(),
        }),
    }
}

fn version_value(template: Option<&ConfigValue>, version: &MigrationVersion) -> ConfigValue {
    let as_integer = version.as_integer().and_then(|n| i64::try_from(n).ok());
    match (template, as_integer) {
        (Some(ConfigValue::String(_)), _) | (_, None) => ConfigValue::from(version.as_str()),
        (Some(ConfigValue::Integer(_)) | None, Some(n)) => ConfigValue::Integer(n),
        (Some(_), Some(_)) => ConfigValue::from(version.as_str()),
    }
}
