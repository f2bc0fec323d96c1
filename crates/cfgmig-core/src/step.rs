//! Migration steps
//!
//! A [`MigrationStep`] transforms a tree from one version to the next. Steps
//! come in two kinds, fixed at construction:
//! - [`StepAction::Plain`] operates on the bare [`ConfigTree`]
//! - [`StepAction::Commented`] sees the [`CommentedConfigTree`] and may edit comments
//!
//! When both kinds are registered for the same transition the commented one
//! is used.

use std::fmt;

use cfgmig_tree::{CommentedConfigTree, ConfigTree, TreeError};

use crate::version::MigrationVersion;

/// Result type returned by step functions
pub type StepResult = Result<(), StepError>;

type PlainFn = dyn Fn(&mut ConfigTree) -> StepResult + Send + Sync;
type CommentedFn = dyn Fn(&mut CommentedConfigTree) -> StepResult + Send + Sync;

/// Transformation applied by a step
pub enum StepAction {
    /// Operates on values only; comments of removed values are pruned afterwards
    Plain(Box<PlainFn>),
    /// Operates on values and comments
    Commented(Box<CommentedFn>),
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain(..)"),
            Self::Commented(_) => f.write_str("Commented(..)"),
        }
    }
}

/// A single version transition
#[derive(Debug)]
pub struct MigrationStep {
    from: MigrationVersion,
    to: MigrationVersion,
    description: Option<String>,
    action: StepAction,
}

impl MigrationStep {
    /// Create a step over the plain tree
    pub fn plain<F>(from: impl Into<MigrationVersion>, to: impl Into<MigrationVersion>, action: F) -> Self
    where
        F: Fn(&mut ConfigTree) -> StepResult + Send + Sync + 'static,
    {
        Self {
            from: from.into(),
            to: to.into(),
            description: None,
            action: StepAction::Plain(Box::new(action)),
        }
    }

    /// Create a step over the commented tree
    pub fn commented<F>(from: impl Into<MigrationVersion>, to: impl Into<MigrationVersion>, action: F) -> Self
    where
        F: Fn(&mut CommentedConfigTree) -> StepResult + Send + Sync + 'static,
    {
        Self {
            from: from.into(),
            to: to.into(),
            description: None,
            action: StepAction::Commented(Box::new(action)),
        }
    }

    /// With human-readable description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn from_version(&self) -> &MigrationVersion {
        &self.from
    }

    #[inline]
    #[must_use]
    pub fn to_version(&self) -> &MigrationVersion {
        &self.to
    }

    /// Description, or `"<from> -> <to>"` when none was given
    #[must_use]
    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("{} -> {}", self.from, self.to))
    }

    #[inline]
    #[must_use]
    pub fn is_commented(&self) -> bool {
        matches!(self.action, StepAction::Commented(_))
    }

    #[inline]
    #[must_use]
    pub fn action(&self) -> &StepAction {
        &self.action
    }

    /// Run the transformation
    ///
    /// # Errors
    /// Propagates whatever the step function returns
    pub fn apply(&self, tree: &mut CommentedConfigTree) -> StepResult {
        match &self.action {
            StepAction::Plain(action) => {
                action(tree.tree_mut())?;
                tree.prune_comments();
                Ok(())
            }
            StepAction::Commented(action) => action(tree),
        }
    }
}

/// Errors raised from inside a step function
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Tree mutation failed
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Data at a path could not be migrated
    #[error("cannot migrate '{path}': {reason}")]
    Invalid { path: String, reason: String },

    /// Any other failure
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create invalid data error
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
