//! cfgmig migration engine
//!
//! Decides whether a loaded configuration needs migrating, walks the
//! registered step chain, reconciles the result with the application's
//! defaults and backs up the original file before anything changes.
//!
//! # Core Concepts
//!
//! - [`MigrationVersion`]: integer, dotted or opaque version token
//! - [`MigrationStep`]: one version transition over a plain or commented tree
//! - [`StepRegistry`]: steps per [`ConfigType`], chain resolution
//! - [`ConfigSchema`]: version field location, target version, defaults
//! - [`BackupManager`]: timestamped copies of the original file
//! - [`MigrationManager`]: orchestrates a run and reports a [`MigrationResult`]
//!
//! # Example
//!
//! ```rust
//! use cfgmig_core::{ConfigSchema, MigrationManager, MigrationStep, BackupManager};
//! use cfgmig_tree::{CommentedConfigTree, MergeStrategy};
//!
//! let mut manager = MigrationManager::new().with_backups(BackupManager::disabled());
//! manager.register_steps("app", [MigrationStep::plain("1", "2", |tree| {
//!     tree.rename("host", "address")?;
//!     Ok(())
//! })])?;
//!
//! let mut loaded = CommentedConfigTree::new();
//! loaded.set("version", 1)?;
//! loaded.set("host", "example.org")?;
//!
//! let schema = ConfigSchema::new("app", "2", CommentedConfigTree::new());
//! let result = manager.migrate(loaded, &schema, Some(MergeStrategy::MergeMissingOnly), None)?;
//! assert!(result.was_migrated());
//! assert!(result.value().contains("address"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod backup;
mod error;
mod hook;
mod manager;
mod registry;
mod result;
mod schema;
mod settings;
mod step;
mod version;

pub use backup::{BackupError, BackupManager, DEFAULT_BACKUP_DIR, DEFAULT_TIMESTAMP_FORMAT};
pub use error::{MigrationError, MigrationOutcome};
pub use hook::{MigrationContext, MigrationHook};
pub use manager::MigrationManager;
pub use registry::{ChainPlan, ConfigType, StepRegistry};
pub use result::MigrationResult;
pub use schema::{read_version_field, ConfigSchema, VersionFieldError, DEFAULT_VERSION_FIELD};
pub use settings::{BackupSettings, MigrationSettings, MissingStepPolicy, SettingsError};
pub use step::{MigrationStep, StepAction, StepError, StepResult};
pub use version::{MigrationVersion, VersionShape};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
