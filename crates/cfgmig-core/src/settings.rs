//! Manager settings
//!
//! [`MigrationSettings`] holds the process-wide behaviour of a
//! [`MigrationManager`](crate::MigrationManager). It can be built in code or
//! loaded from TOML:
//!
//! ```toml
//! missing_step_policy = "skip"
//! default_strategy = "merge-missing-only"
//!
//! [backup]
//! enabled = true
//! directory = "config-backups"
//! ```

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cfgmig_tree::MergeStrategy;
use serde::{Deserialize, Serialize};

use crate::backup::DEFAULT_TIMESTAMP_FORMAT;

/// What to do when no contiguous step chain reaches the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingStepPolicy {
    /// Abort with [`MigrationError::IncompleteMigrationChain`](crate::MigrationError::IncompleteMigrationChain)
    #[default]
    Fail,
    /// Apply the registered prefix, then stamp the target version
    Skip,
}

impl MissingStepPolicy {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

impl Display for MissingStepPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingStepPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            _ => Err(SettingsError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Backup behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Whether backups are written at all
    pub enabled: bool,
    /// Fixed backup directory; `None` uses a `backups/` directory next to each file
    pub directory: Option<PathBuf>,
    /// strftime layout of the timestamp in backup names
    pub timestamp_format: String,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Migration manager configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Behaviour on gaps in the step chain
    pub missing_step_policy: MissingStepPolicy,
    /// Strategy used when the caller does not pick one
    pub default_strategy: MergeStrategy,
    /// Backup behaviour
    pub backup: BackupSettings,
}

impl MigrationSettings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from TOML text
    ///
    /// # Errors
    /// Returns [`SettingsError::Parse`] for malformed TOML or unknown values
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file
    ///
    /// # Errors
    /// Returns [`SettingsError`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| SettingsError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_toml_str(&text)
    }

    /// With missing step policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: MissingStepPolicy) -> Self {
        self.missing_step_policy = policy;
        self
    }

    /// With default merge strategy
    #[inline]
    #[must_use]
    pub fn with_default_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// With fixed backup directory
    #[inline]
    #[must_use]
    pub fn with_backup_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.backup.directory = Some(directory.into());
        self
    }

    /// With backups turned off
    #[inline]
    #[must_use]
    pub fn without_backups(mut self) -> Self {
        self.backup.enabled = false;
        self
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("cannot read settings file '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings text is not valid
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Unrecognized missing step policy name
    #[error("unknown missing step policy '{0}' (expected fail or skip)")]
    UnknownPolicy(String),
}
