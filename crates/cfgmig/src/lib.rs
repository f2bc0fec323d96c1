//! cfgmig - versioned configuration files
//!
//! Loads a configuration file, migrates it to the version the application
//! expects, backs up the original and writes the result back in the same
//! format.
//!
//! # Core Concepts
//!
//! - [`ConfigStore`]: file-level load / migrate / save
//! - [`ConfigSchema`]: version field, target version, defaults and header
//! - [`MigrationManager`]: registered steps, backups and policies
//!
//! # Example
//!
//! ```rust,no_run
//! use cfgmig::{ConfigSchema, ConfigStore, MigrationManager, MigrationStep};
//! use cfgmig_tree::CommentedConfigTree;
//! use std::path::Path;
//!
//! #[derive(serde::Deserialize)]
//! struct AppConfig {
//!     version: u32,
//!     title: String,
//! }
//!
//! let mut manager = MigrationManager::new();
//! manager.register_steps("app", [MigrationStep::plain("1", "2", |tree| {
//!     tree.rename("name", "title")?;
//!     Ok(())
//! })])?;
//!
//! let mut defaults = CommentedConfigTree::new();
//! defaults.set("version", 2)?;
//! defaults.set("title", "My App")?;
//!
//! let store = ConfigStore::new(manager);
//! let schema = ConfigSchema::new("app", "2", defaults);
//! let result = store.load_with_migration::<AppConfig>(Path::new("app.toml"), &schema, None)?;
//! println!("loaded {} (migrated: {})", result.value().title, result.was_migrated());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod store;

pub use cfgmig_core::{
    BackupManager, ConfigSchema, MigrationError, MigrationManager, MigrationResult, MigrationSettings,
    MigrationStep, MigrationVersion, MissingStepPolicy,
};
pub use cfgmig_format::{ConfigFormat, FormatRegistry};
pub use cfgmig_tree::MergeStrategy;
pub use error::{StoreError, StoreResult};
pub use store::ConfigStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
