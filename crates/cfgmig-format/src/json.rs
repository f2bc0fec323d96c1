//! JSON codec
//!
//! JSON has no comment syntax; comments and headers are dropped on encode.

use cfgmig_tree::{CommentedConfigTree, ConfigValue};

use crate::error::FormatError;
use crate::ConfigFormat;

/// JSON via `serde_json`, pretty-printed
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl ConfigFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn decode(&self, text: &str) -> Result<CommentedConfigTree, FormatError> {
        let value: ConfigValue =
            serde_json::from_str(text).map_err(|e| FormatError::decode(self.name(), e))?;
        match value {
            ConfigValue::Table(tree) => Ok(tree.into()),
            other => Err(FormatError::NotATable {
                format: self.name(),
                found: other.kind(),
            }),
        }
    }

    fn encode(&self, tree: &CommentedConfigTree, _header: Option<&str>) -> Result<String, FormatError> {
        let mut text =
            serde_json::to_string_pretty(tree.tree()).map_err(|e| FormatError::encode(self.name(), e))?;
        text.push('\n');
        Ok(text)
    }
}
