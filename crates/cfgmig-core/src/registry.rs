//! Step registry keyed by configuration type
//!
//! Provides [`StepRegistry`] for storing migration steps and resolving the
//! chain that connects a loaded version to a target version.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::error::MigrationError;
use crate::step::MigrationStep;
use crate::version::MigrationVersion;

/// Name of a configuration type
///
/// Steps are registered per type so one manager can serve several files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigType(String);

impl ConfigType {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive the name from a Rust type
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConfigType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ConfigType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Resolved sequence of steps for one migration run
#[derive(Debug)]
pub struct ChainPlan<'a> {
    /// Steps in application order
    pub steps: Vec<&'a MigrationStep>,
    /// Version reached after the last step
    pub reached: MigrationVersion,
    /// Whether `reached` equals the requested target
    pub complete: bool,
}

/// Registry of migration steps per configuration type
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: HashMap<ConfigType, Vec<MigrationStep>>,
}

impl StepRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    /// Register steps for a configuration type
    ///
    /// The batch is validated as a whole before anything is stored.
    ///
    /// # Errors
    /// - [`MigrationError::NonAdvancingStep`] if a step's target is not newer than its source
    /// - [`MigrationError::DuplicateStep`] if a step of the same kind already covers the pair
    pub fn register(
        &mut self,
        config_type: ConfigType,
        steps: impl IntoIterator<Item = MigrationStep>,
    ) -> Result<(), MigrationError> {
        let batch: Vec<MigrationStep> = steps.into_iter().collect();
        let existing = self.steps.get(&config_type).map_or(&[][..], Vec::as_slice);

        for (index, step) in batch.iter().enumerate() {
            if !step.to_version().is_newer_than(step.from_version()) {
                return Err(MigrationError::NonAdvancingStep {
                    config_type,
                    from: step.from_version().clone(),
                    to: step.to_version().clone(),
                });
            }

            let duplicate = existing
                .iter()
                .chain(&batch[..index])
                .any(|other| same_transition(step, other));
            if duplicate {
                return Err(MigrationError::DuplicateStep {
                    config_type,
                    from: step.from_version().clone(),
                    to: step.to_version().clone(),
                });
            }
        }

        tracing::debug!("Registered {} migration steps for {}", batch.len(), config_type);
        self.steps.entry(config_type).or_default().extend(batch);
        Ok(())
    }

    /// Steps registered for a type, in registration order
    #[must_use]
    pub fn steps(&self, config_type: &ConfigType) -> &[MigrationStep] {
        self.steps.get(config_type).map_or(&[][..], Vec::as_slice)
    }

    /// Remove all steps of a type
    pub fn clear(&mut self, config_type: &ConfigType) -> bool {
        self.steps.remove(config_type).is_some()
    }

    pub fn clear_all(&mut self) {
        self.steps.clear();
    }

    /// Total number of registered steps across all types
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.values().map(Vec::len).sum()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the chain from `from` towards `target`
    ///
    /// At each version the most recently registered step leaving it decides
    /// the next version; among steps for that exact transition a commented
    /// step is preferred over a plain one. The walk stops on reaching the
    /// target or at a version with no usable step; a step that would jump
    /// past the target is never taken.
    #[must_use]
    pub fn plan<'a>(
        &'a self,
        config_type: &ConfigType,
        from: &MigrationVersion,
        target: &MigrationVersion,
    ) -> ChainPlan<'a> {
        let registered = self.steps(config_type);
        let mut chain = Vec::new();
        let mut cursor = from.clone();

        // steps strictly advance, so each one is used at most once
        while cursor < *target && chain.len() < registered.len() {
            let Some(step) = select_step(config_type, registered, &cursor) else {
                break;
            };
            if step.to_version() > target {
                tracing::debug!(
                    "Step {} -> {} for {} jumps past target {}",
                    cursor,
                    step.to_version(),
                    config_type,
                    target
                );
                break;
            }
            cursor = step.to_version().clone();
            chain.push(step);
        }

        let complete = cursor == *target;
        ChainPlan {
            steps: chain,
            reached: cursor,
            complete,
        }
    }
}

fn same_transition(a: &MigrationStep, b: &MigrationStep) -> bool {
    a.from_version() == b.from_version()
        && a.to_version() == b.to_version()
        && a.is_commented() == b.is_commented()
}

fn select_step<'a>(
    config_type: &ConfigType,
    registered: &'a [MigrationStep],
    cursor: &MigrationVersion,
) -> Option<&'a MigrationStep> {
    let leaving: Vec<&MigrationStep> = registered
        .iter()
        .filter(|step| step.from_version() == cursor)
        .collect();
    let latest = *leaving.last()?;
    let next = latest.to_version();

    if leaving.iter().any(|step| step.to_version() != next) {
        tracing::warn!(
            "Several migration steps leave {} for {}; using the last registered, to {}",
            cursor,
            config_type,
            next
        );
    }

    let (commented, plain): (Vec<_>, Vec<_>) = leaving
        .into_iter()
        .filter(|step| step.to_version() == next)
        .partition(|step| step.is_commented());
    match (commented.last(), plain.last()) {
        (Some(commented), Some(_)) => {
            tracing::debug!(
                "Commented step {} -> {} shadows plain step for {}",
                cursor,
                next,
                config_type
            );
            Some(*commented)
        }
        (Some(commented), None) => Some(*commented),
        (None, plain) => plain.copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgmig_tree::{CommentedConfigTree, ConfigValue};

    fn set(from: &str, to: &str, key: &'static str, value: i64) -> MigrationStep {
        MigrationStep::plain(from, to, move |tree| {
            tree.set(key, value)?;
            Ok(())
        })
    }

    fn app() -> ConfigType {
        ConfigType::from("app")
    }

    #[test]
    fn plan_follows_contiguous_chain() {
        let mut registry = StepRegistry::new();
        registry
            .register(app(), [set("1", "2", "a", 1), set("2", "3", "b", 2)])
            .unwrap();

        let plan = registry.plan(&app(), &"1".into(), &"3".into());
        assert!(plan.complete);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.reached, MigrationVersion::from("3"));
    }

    #[test]
    fn plan_reports_gap() {
        let mut registry = StepRegistry::new();
        registry.register(app(), [set("1", "2", "a", 1)]).unwrap();

        let plan = registry.plan(&app(), &"1".into(), &"3".into());
        assert!(!plan.complete);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.reached, MigrationVersion::from("2"));
    }

    #[test]
    fn plan_stops_when_step_overshoots() {
        let mut registry = StepRegistry::new();
        registry.register(app(), [set("1", "5", "a", 1)]).unwrap();

        let plan = registry.plan(&app(), &"1".into(), &"3".into());
        assert!(!plan.complete);
        assert!(plan.steps.is_empty());
        assert_eq!(plan.reached, MigrationVersion::from("1"));
    }

    #[test]
    fn steps_are_scoped_per_type() {
        let mut registry = StepRegistry::new();
        registry.register(app(), [set("1", "2", "a", 1)]).unwrap();
        let plan = registry.plan(&ConfigType::from("other"), &"1".into(), &"2".into());
        assert!(plan.steps.is_empty());
        assert!(!plan.complete);
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let mut registry = StepRegistry::new();
        registry.register(app(), [set("1", "2", "a", 1)]).unwrap();
        let err = registry.register(app(), [set("1", "2", "a", 2)]).unwrap_err();
        assert!(matches!(err, MigrationError::DuplicateStep { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_within_batch_rejects_whole_batch() {
        let mut registry = StepRegistry::new();
        let err = registry
            .register(app(), [set("1", "2", "a", 1), set("2", "3", "b", 1), set("1", "2", "c", 1)])
            .unwrap_err();
        assert!(err.is_registration_error());
        assert!(registry.is_empty());
    }

    #[test]
    fn non_advancing_step_is_rejected() {
        let mut registry = StepRegistry::new();
        for (from, to) in [("2", "2"), ("3", "1"), ("1", "1.0")] {
            let err = registry.register(app(), [set(from, to, "a", 1)]).unwrap_err();
            assert!(matches!(err, MigrationError::NonAdvancingStep { .. }), "{from} -> {to}");
        }
    }

    #[test]
    fn commented_step_takes_precedence() {
        let mut registry = StepRegistry::new();
        let commented = MigrationStep::commented("1", "2", |tree| {
            tree.set("via", "commented")?;
            Ok(())
        });
        registry
            .register(app(), [commented, set("1", "2", "via", 0)])
            .unwrap();

        let plan = registry.plan(&app(), &"1".into(), &"2".into());
        assert_eq!(plan.steps.len(), 1);
        assert!(plan.steps[0].is_commented());

        let mut tree = CommentedConfigTree::new();
        plan.steps[0].apply(&mut tree).unwrap();
        assert_eq!(tree.get("via"), Some(&ConfigValue::from("commented")));
    }

    #[test]
    fn last_registered_target_wins() {
        let mut registry = StepRegistry::new();
        registry
            .register(app(), [set("1", "2", "a", 1), set("1", "3", "b", 1)])
            .unwrap();

        let plan = registry.plan(&app(), &"1".into(), &"3".into());
        assert!(plan.complete);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].to_version(), &MigrationVersion::from("3"));
    }

    #[test]
    fn unversioned_start() {
        let mut registry = StepRegistry::new();
        registry
            .register(app(), [set_from_unversioned(), set("1", "2", "b", 1)])
            .unwrap();
        let plan = registry.plan(&app(), &MigrationVersion::unversioned(), &"2".into());
        assert!(plan.complete);
        assert_eq!(plan.steps.len(), 2);
    }

    fn set_from_unversioned() -> MigrationStep {
        MigrationStep::plain(MigrationVersion::unversioned(), "1", |tree| {
            tree.set("a", 1)?;
            Ok(())
        })
    }

    #[test]
    fn clear_operations() {
        let mut registry = StepRegistry::new();
        registry.register(app(), [set("1", "2", "a", 1)]).unwrap();
        registry
            .register(ConfigType::from("other"), [set("1", "2", "a", 1)])
            .unwrap();
        assert_eq!(registry.len(), 2);

        assert!(registry.clear(&app()));
        assert!(!registry.clear(&app()));
        assert!(registry.steps(&app()).is_empty());
        assert_eq!(registry.len(), 1);

        registry.clear_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn config_type_from_rust_type() {
        struct Settings;
        let ty = ConfigType::of::<Settings>();
        assert!(ty.as_str().ends_with("Settings"));
    }
}
