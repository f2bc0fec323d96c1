//! Store errors

use std::path::PathBuf;

use cfgmig_core::MigrationError;
use cfgmig_format::FormatError;
use cfgmig_tree::TreeError;

/// Errors while loading, migrating or saving a configuration file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File could not be read or written
    #[error("I/O error on '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No codec for the file extension
    #[error("no format registered for '{}'", .0.display())]
    NoCodec(PathBuf),

    /// File contents did not decode, or the tree did not bind
    #[error("format error in '{}'", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Migration aborted; the file on disk is untouched
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Defaults could not be version-stamped
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, source: FormatError) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }

    /// Check if the migration engine rejected the file
    #[inline]
    #[must_use]
    pub fn is_migration_error(&self) -> bool {
        matches!(self, Self::Migration(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
