//! Error types for the migration engine
//!
//! Provides error handling for:
//! - Step registration (duplicates, non-advancing steps)
//! - Chain resolution (gaps, downgrades)
//! - Version field decoding
//! - Backup and step execution failures

use std::path::PathBuf;

use cfgmig_tree::TreeError;

use crate::backup::BackupError;
use crate::registry::ConfigType;
use crate::step::StepError;
use crate::version::MigrationVersion;

/// Main migration error type
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A step with the same version pair and kind is already registered
    #[error("duplicate migration step {from} -> {to} for {config_type}")]
    DuplicateStep {
        config_type: ConfigType,
        from: MigrationVersion,
        to: MigrationVersion,
    },

    /// A step whose target is not strictly newer than its source
    #[error("migration step {from} -> {to} for {config_type} does not advance the version")]
    NonAdvancingStep {
        config_type: ConfigType,
        from: MigrationVersion,
        to: MigrationVersion,
    },

    /// No contiguous chain connects the loaded version to the target
    #[error("missing migration step for {config_type}: chain stops at {reached}, target is {target}")]
    IncompleteMigrationChain {
        config_type: ConfigType,
        /// Last version the registered steps reach
        reached: MigrationVersion,
        target: MigrationVersion,
    },

    /// The loaded file is newer than the application understands
    #[error("cannot migrate {config_type} from newer version {loaded} to older version {target}")]
    NewerThanTarget {
        config_type: ConfigType,
        loaded: MigrationVersion,
        target: MigrationVersion,
    },

    /// The version field holds a value that is not a version
    #[error("version field '{path}' holds a {found}, expected a non-negative number or a string")]
    InvalidVersionField { path: String, found: &'static str },

    /// Backup of the original file could not be written
    #[error("backup of '{}' failed", .path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: BackupError,
    },

    /// A step raised an error while transforming the tree
    #[error("migration step {from} -> {to} failed")]
    StepFailed {
        from: MigrationVersion,
        to: MigrationVersion,
        #[source]
        source: StepError,
    },

    /// Tree mutation failed outside a step (version stamping)
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl MigrationError {
    /// Create incomplete chain error
    pub fn incomplete_chain(
        config_type: ConfigType,
        reached: MigrationVersion,
        target: MigrationVersion,
    ) -> Self {
        Self::IncompleteMigrationChain {
            config_type,
            reached,
            target,
        }
    }

    /// Create backup failure error
    pub fn backup_failed(path: impl Into<PathBuf>, source: BackupError) -> Self {
        Self::BackupFailed {
            path: path.into(),
            source,
        }
    }

    /// Create step failure error
    pub fn step_failed(from: MigrationVersion, to: MigrationVersion, source: StepError) -> Self {
        Self::StepFailed { from, to, source }
    }

    /// Check if error was raised while registering steps
    #[inline]
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(self, Self::DuplicateStep { .. } | Self::NonAdvancingStep { .. })
    }

    /// Check if error is a path collision, directly or inside a step
    #[must_use]
    pub fn is_type_conflict(&self) -> bool {
        match self {
            Self::Tree(err) => err.is_type_conflict(),
            Self::StepFailed {
                source: StepError::Tree(err),
                ..
            } => err.is_type_conflict(),
            _ => false,
        }
    }

    /// Version pair the error refers to, if any
    #[must_use]
    pub fn version_pair(&self) -> Option<(&MigrationVersion, &MigrationVersion)> {
        match self {
            Self::DuplicateStep { from, to, .. }
            | Self::NonAdvancingStep { from, to, .. }
            | Self::StepFailed { from, to, .. } => Some((from, to)),
            Self::IncompleteMigrationChain {
                reached, target, ..
            } => Some((reached, target)),
            Self::NewerThanTarget { loaded, target, .. } => Some((loaded, target)),
            _ => None,
        }
    }
}

/// Result alias for migration operations
pub type MigrationOutcome<T> = Result<T, MigrationError>;
