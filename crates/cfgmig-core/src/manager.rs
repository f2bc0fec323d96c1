//! Migration orchestration
//!
//! [`MigrationManager`] owns the step registry, the backup store and the
//! hooks, and drives one migration run:
//! 1. Read the loaded version (missing → assumed or unversioned)
//! 2. Short-circuit when it equals the target
//! 3. Reject downgrades
//! 4. Resolve the step chain; under [`MissingStepPolicy::Fail`] a gap aborts here
//! 5. Back up the source file
//! 6. Apply the steps in order
//! 7. Apply the merge strategy against the defaults
//! 8. Stamp the target version
//!
//! Nothing is written to disk except the backup; the caller persists the
//! returned tree.

use std::path::Path;
use std::sync::Arc;

use cfgmig_tree::{CommentedConfigTree, MergeStrategy};

use crate::backup::BackupManager;
use crate::error::{MigrationError, MigrationOutcome};
use crate::hook::{MigrationContext, MigrationHook};
use crate::registry::{ConfigType, StepRegistry};
use crate::result::MigrationResult;
use crate::schema::ConfigSchema;
use crate::settings::{MigrationSettings, MissingStepPolicy};
use crate::step::MigrationStep;

/// Drives migrations for any number of configuration types
pub struct MigrationManager {
    registry: StepRegistry,
    backups: BackupManager,
    policy: MissingStepPolicy,
    default_strategy: MergeStrategy,
    hooks: Vec<Arc<dyn MigrationHook>>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::from_settings(&MigrationSettings::default())
    }
}

impl std::fmt::Debug for MigrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationManager")
            .field("registry", &self.registry)
            .field("backups", &self.backups)
            .field("policy", &self.policy)
            .field("default_strategy", &self.default_strategy)
            .field("hook_count", &self.hooks.len())
            .finish()
    }
}

impl MigrationManager {
    /// Create manager with default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_settings(settings: &MigrationSettings) -> Self {
        Self {
            registry: StepRegistry::new(),
            backups: BackupManager::from_settings(&settings.backup),
            policy: settings.missing_step_policy,
            default_strategy: settings.default_strategy,
            hooks: Vec::new(),
        }
    }

    /// With backup store
    #[inline]
    #[must_use]
    pub fn with_backups(mut self, backups: BackupManager) -> Self {
        self.backups = backups;
        self
    }

    /// With missing step policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: MissingStepPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register the steps of a configuration type
    ///
    /// # Errors
    /// See [`StepRegistry::register`]
    pub fn register_steps(
        &mut self,
        config_type: impl Into<ConfigType>,
        steps: impl IntoIterator<Item = MigrationStep>,
    ) -> MigrationOutcome<()> {
        self.registry.register(config_type.into(), steps)
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut StepRegistry {
        &mut self.registry
    }

    #[inline]
    #[must_use]
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn set_backups(&mut self, backups: BackupManager) {
        self.backups = backups;
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> MissingStepPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: MissingStepPolicy) {
        self.policy = policy;
    }

    #[inline]
    #[must_use]
    pub fn default_strategy(&self) -> MergeStrategy {
        self.default_strategy
    }

    pub fn set_default_strategy(&mut self, strategy: MergeStrategy) {
        self.default_strategy = strategy;
    }

    /// Add hook; hooks run in the order they were added
    pub fn add_hook(&mut self, hook: Arc<dyn MigrationHook>) {
        self.hooks.push(hook);
    }

    pub fn clear_hooks(&mut self) {
        self.hooks.clear();
    }

    /// Migrate a loaded tree to the schema's target version
    ///
    /// `strategy` falls back to the manager's default. `source` is the file
    /// the tree was read from; it is backed up before any step runs.
    ///
    /// # Errors
    /// - [`MigrationError::InvalidVersionField`] if the version field is not a version
    /// - [`MigrationError::NewerThanTarget`] for downgrades
    /// - [`MigrationError::IncompleteMigrationChain`] on a gap in a registered chain under the fail policy
    /// - [`MigrationError::BackupFailed`] if the backup cannot be written
    /// - [`MigrationError::StepFailed`] if a step returns an error
    pub fn migrate(
        &self,
        tree: CommentedConfigTree,
        schema: &ConfigSchema,
        strategy: Option<MergeStrategy>,
        source: Option<&Path>,
    ) -> MigrationOutcome<MigrationResult> {
        let strategy = strategy.unwrap_or(self.default_strategy);
        let config_type = schema.config_type();
        let target = schema.target_version();

        let loaded = schema.read_version(tree.tree()).map_err(|err| {
            let err = MigrationError::from(err);
            tracing::error!("Cannot read version of {}: {}", config_type, err);
            err
        })?;

        if loaded == *target {
            tracing::debug!("{} already at version {}", config_type, target);
            for hook in &self.hooks {
                hook.on_no_migration_needed(config_type, target);
            }
            return Ok(MigrationResult::unchanged(tree, loaded));
        }

        let ctx = MigrationContext {
            config_type,
            source,
            from: &loaded,
            to: target,
            strategy,
        };

        self.run(tree, schema, &ctx).map_err(|err| {
            tracing::error!(
                "Migration of {} from {} to {} failed: {}",
                config_type,
                loaded,
                target,
                err
            );
            for hook in &self.hooks {
                hook.on_migration_failed(&ctx, &err);
            }
            err
        })
    }

    fn run(
        &self,
        mut tree: CommentedConfigTree,
        schema: &ConfigSchema,
        ctx: &MigrationContext<'_>,
    ) -> MigrationOutcome<MigrationResult> {
        if ctx.from.is_newer_than(ctx.to) {
            return Err(MigrationError::NewerThanTarget {
                config_type: ctx.config_type.clone(),
                loaded: ctx.from.clone(),
                target: ctx.to.clone(),
            });
        }

        // a type without steps only needs its version stamped and its defaults merged
        let has_steps = !self.registry.steps(ctx.config_type).is_empty();
        let plan = self.registry.plan(ctx.config_type, ctx.from, ctx.to);
        if !plan.complete && has_steps && self.policy == MissingStepPolicy::Fail {
            return Err(MigrationError::incomplete_chain(
                ctx.config_type.clone(),
                plan.reached,
                ctx.to.clone(),
            ));
        }

        tracing::info!(
            "Migrating {} from {} to {} ({} steps, {})",
            ctx.config_type,
            ctx.from,
            ctx.to,
            plan.steps.len(),
            ctx.strategy
        );
        for hook in &self.hooks {
            hook.before_migration(ctx);
        }

        let backup_path = match ctx.source {
            Some(source) => self.back_up(source, ctx)?,
            None => None,
        };
        for hook in &self.hooks {
            hook.after_backup(ctx, backup_path.as_deref());
        }

        for step in &plan.steps {
            tracing::info!(
                "Applying step {} -> {}: {}",
                step.from_version(),
                step.to_version(),
                step.description()
            );
            step.apply(&mut tree).map_err(|err| {
                MigrationError::step_failed(step.from_version().clone(), step.to_version().clone(), err)
            })?;
        }

        if !has_steps {
            tracing::debug!("No migration steps registered for {}; stamping {}", ctx.config_type, ctx.to);
        } else if !plan.complete {
            tracing::warn!(
                "No migration step from {} for {}; jumping to {}",
                plan.reached,
                ctx.config_type,
                ctx.to
            );
        }

        ctx.strategy.apply(&mut tree, schema.defaults());
        schema.stamp_version(tree.tree_mut(), ctx.to)?;

        for hook in &self.hooks {
            hook.after_migration(ctx, backup_path.as_deref());
        }
        tracing::info!("Migrated {} to {}", ctx.config_type, ctx.to);

        Ok(MigrationResult::migrated(
            tree,
            ctx.from.clone(),
            ctx.to.clone(),
            backup_path,
            plan.steps.len(),
            plan.complete || !has_steps,
        ))
    }

    fn back_up(&self, source: &Path, ctx: &MigrationContext<'_>) -> MigrationOutcome<Option<std::path::PathBuf>> {
        match self.backups.backup(source, &ctx.from.to_string()) {
            Ok(path) => Ok(path),
            Err(err) if !err.is_fatal() => {
                tracing::warn!("Source {} vanished during backup: {}", source.display(), err);
                Ok(None)
            }
            Err(err) => Err(MigrationError::backup_failed(source, err)),
        }
    }
}
