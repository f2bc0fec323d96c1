//! Typed values to and from configuration trees, through `serde`

use cfgmig_tree::{ConfigTree, ConfigValue};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FormatError;

/// Deserialize a typed value from a tree
///
/// # Errors
///
/// Returns [`FormatError::Bind`] when the tree does not match `T`.
pub fn bind<T: DeserializeOwned>(tree: &ConfigTree) -> Result<T, FormatError> {
    let value = serde_json::to_value(tree).map_err(|e| FormatError::Bind(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| FormatError::Bind(e.to_string()))
}

/// Serialize a typed value into a tree
///
/// # Errors
///
/// Returns [`FormatError::Bind`] when `T` does not serialize to a table.
pub fn unbind<T: Serialize>(value: &T) -> Result<ConfigTree, FormatError> {
    let json = serde_json::to_value(value).map_err(|e| FormatError::Bind(e.to_string()))?;
    let converted: ConfigValue =
        serde_json::from_value(json).map_err(|e| FormatError::Bind(e.to_string()))?;
    match converted {
        ConfigValue::Table(tree) => Ok(tree),
        other => Err(FormatError::Bind(format!(
            "value serializes to a {}, expected a table",
            other.kind()
        ))),
    }
}
