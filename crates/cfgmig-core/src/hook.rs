//! Callbacks around a migration run

use std::path::Path;

use cfgmig_tree::MergeStrategy;

use crate::error::MigrationError;
use crate::registry::ConfigType;
use crate::version::MigrationVersion;

/// What a migration run is doing
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    pub config_type: &'a ConfigType,
    /// File the tree was loaded from, if any
    pub source: Option<&'a Path>,
    pub from: &'a MigrationVersion,
    pub to: &'a MigrationVersion,
    pub strategy: MergeStrategy,
}

/// Observer of migration runs
///
/// Every method defaults to a no-op. Hooks run in registration order and
/// cannot abort a migration.
pub trait MigrationHook: Send + Sync {
    /// Called once the chain is resolved, before the backup
    fn before_migration(&self, _ctx: &MigrationContext<'_>) {}

    /// Called after the backup step; `backup` is `None` when nothing was written
    fn after_backup(&self, _ctx: &MigrationContext<'_>, _backup: Option<&Path>) {}

    /// Called after steps, merge and version stamp succeeded
    fn after_migration(&self, _ctx: &MigrationContext<'_>, _backup: Option<&Path>) {}

    /// Called when the run aborts
    fn on_migration_failed(&self, _ctx: &MigrationContext<'_>, _error: &MigrationError) {}

    /// Called when the loaded version already equals the target
    fn on_no_migration_needed(&self, _config_type: &ConfigType, _version: &MigrationVersion) {}
}
