//! Error types for tree mutation

use crate::path::PathError;

/// Errors raised while mutating a configuration tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// An intermediate segment holds a scalar or list instead of a tree
    #[error("type conflict at '{path}': '{segment}' holds a {found}, not a table")]
    TypeConflict {
        /// Full path being written
        path: String,
        /// Prefix of `path` that resolved to a non-table value
        segment: String,
        /// Kind of the value found at `segment`
        found: &'static str,
    },

    /// Path text could not be parsed
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Operation needs a value path, got the root
    #[error("operation requires a non-root path")]
    EmptyPath,

    /// Source and destination of a move nest inside each other
    #[error("cannot move '{from}' to '{to}': one path contains the other")]
    OverlappingPaths { from: String, to: String },
}

impl TreeError {
    /// Create a type conflict error
    pub fn type_conflict(
        path: impl Into<String>,
        segment: impl Into<String>,
        found: &'static str,
    ) -> Self {
        Self::TypeConflict {
            path: path.into(),
            segment: segment.into(),
            found,
        }
    }

    /// Check if this is a path collision
    #[inline]
    #[must_use]
    pub fn is_type_conflict(&self) -> bool {
        matches!(self, Self::TypeConflict { .. })
    }
}
