//! Reconciling a loaded tree against application defaults

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::commented::CommentedConfigTree;
use crate::path::ConfigPath;
use crate::tree::ConfigTree;
use crate::value::ConfigValue;

/// Policy applied once after the step chain completes
///
/// | Strategy | In both | Missing from loaded | Only in loaded |
/// |---|---|---|---|
/// | `Override` | default wins | added | dropped |
/// | `MergeMissingOnly` | loaded wins | added | kept |
/// | `VersionOnly` | loaded wins | not added | kept |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Replace the loaded tree with the defaults
    Override,
    /// Keep user values, fill in missing keys from defaults
    #[default]
    MergeMissingOnly,
    /// Leave the tree alone apart from the version stamp
    VersionOnly,
}

impl MergeStrategy {
    /// All strategies, in declaration order
    pub const ALL: [Self; 3] = [Self::Override, Self::MergeMissingOnly, Self::VersionOnly];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::MergeMissingOnly => "merge-missing-only",
            Self::VersionOnly => "version-only",
        }
    }

    /// Apply this strategy to `loaded`, using `defaults` as the reference
    ///
    /// Returns whether `loaded` changed.
    pub fn apply(self, loaded: &mut CommentedConfigTree, defaults: &CommentedConfigTree) -> bool {
        match self {
            Self::Override => {
                if loaded == defaults {
                    return false;
                }
                *loaded = defaults.clone();
                true
            }
            Self::MergeMissingOnly => {
                let added = merge_missing(loaded.tree_mut(), defaults.tree());

                let inherited: Vec<(ConfigPath, String)> = defaults
                    .comments()
                    .filter(|(path, _)| {
                        loaded.comment_at(path).is_none() && loaded.tree().contains_at(path)
                    })
                    .map(|(path, comment)| (path.clone(), comment.to_string()))
                    .collect();
                let comments_added = !inherited.is_empty();
                if comments_added {
                    let merged = loaded
                        .comments()
                        .map(|(p, c)| (p.clone(), c.to_string()))
                        .chain(inherited)
                        .collect::<Vec<_>>();
                    loaded.replace_comments(merged);
                }

                added > 0 || comments_added
            }
            Self::VersionOnly => false,
        }
    }
}

impl Display for MergeStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Unrecognized merge strategy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown merge strategy '{0}' (expected override, merge-missing-only or version-only)")]
pub struct UnknownStrategy(pub String);

/// Recursively add keys present in `defaults` but absent from `loaded`
///
/// Existing loaded values are never replaced, except an explicit null,
/// which counts as missing. When both sides hold a tree under the same key
/// the merge descends; any other pairing keeps the loaded value. Returns the
/// number of values added.
pub fn merge_missing(loaded: &mut ConfigTree, defaults: &ConfigTree) -> usize {
    let mut added = 0;
    for (key, default_value) in defaults.iter() {
        let existing = loaded.get_at_mut(&ConfigPath::single(key));
        match (existing, default_value) {
            (None, value) => {
                loaded.insert(key, value.clone());
                added += 1;
            }
            (Some(slot), value) if slot.is_null() && !value.is_null() => {
                *slot = value.clone();
                added += 1;
            }
            (Some(ConfigValue::Table(nested)), ConfigValue::Table(default_nested)) => {
                added += merge_missing(nested, default_nested);
            }
            (Some(_), _) => {}
        }
    }
    added
}
