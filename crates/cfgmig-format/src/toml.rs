//! TOML codec
//!
//! TOML has no null, so `Null` values are dropped on encode. Datetimes
//! decode to their RFC 3339 text. Plain keys are written before tables so
//! every key stays in the section it belongs to.

use cfgmig_tree::{CommentedConfigTree, ConfigPath, ConfigTree, ConfigValue};

use crate::error::FormatError;
use crate::{write_comment, ConfigFormat};

/// TOML via `toml`
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl ConfigFormat for TomlFormat {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn supports_comments(&self) -> bool {
        true
    }

    fn decode(&self, text: &str) -> Result<CommentedConfigTree, FormatError> {
        let table: toml::Table = toml::from_str(text).map_err(|e| FormatError::decode(self.name(), e))?;
        Ok(from_toml_table(table).into())
    }

    fn encode(&self, tree: &CommentedConfigTree, header: Option<&str>) -> Result<String, FormatError> {
        let mut out = String::new();
        if let Some(header) = header {
            write_comment(&mut out, header);
            out.push('\n');
        }

        let (plain, sections): (Vec<_>, Vec<_>) = tree
            .tree()
            .iter()
            .filter(|(_, value)| !value.is_null())
            .partition(|(_, value)| !is_section(value));

        for (index, (key, value)) in plain.into_iter().chain(sections).enumerate() {
            let Some(value) = to_toml(value) else {
                continue;
            };
            let mut entry = toml::Table::new();
            entry.insert(key.to_string(), value);
            let text = toml::to_string(&entry).map_err(|e| FormatError::encode(self.name(), e))?;

            if index > 0 && text.starts_with('[') {
                out.push('\n');
            }
            if let Some(comment) = tree.comment_at(&ConfigPath::single(key)) {
                write_comment(&mut out, comment);
            }
            out.push_str(&text);
        }
        Ok(out)
    }
}

/// Tables and arrays of tables open a `[section]`
fn is_section(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Table(_) => true,
        ConfigValue::List(items) => !items.is_empty() && items.iter().all(ConfigValue::is_table),
        _ => false,
    }
}

fn to_toml(value: &ConfigValue) -> Option<toml::Value> {
    let converted = match value {
        ConfigValue::Null => return None,
        ConfigValue::Bool(b) => toml::Value::Boolean(*b),
        ConfigValue::Integer(i) => toml::Value::Integer(*i),
        ConfigValue::Float(f) => toml::Value::Float(*f),
        ConfigValue::String(s) => toml::Value::String(s.clone()),
        ConfigValue::List(items) => toml::Value::Array(items.iter().filter_map(to_toml).collect()),
        ConfigValue::Table(tree) => toml::Value::Table(to_toml_table(tree)),
    };
    Some(converted)
}

fn to_toml_table(tree: &ConfigTree) -> toml::Table {
    tree.iter()
        .filter_map(|(key, value)| to_toml(value).map(|v| (key.to_string(), v)))
        .collect()
}

fn from_toml(value: toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(s) => ConfigValue::String(s),
        toml::Value::Integer(i) => ConfigValue::Integer(i),
        toml::Value::Float(f) => ConfigValue::Float(f),
        toml::Value::Boolean(b) => ConfigValue::Bool(b),
        toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
        toml::Value::Array(items) => ConfigValue::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => ConfigValue::Table(from_toml_table(table)),
    }
}

fn from_toml_table(table: toml::Table) -> ConfigTree {
    table
        .into_iter()
        .map(|(key, value)| (key, from_toml(value)))
        .collect()
}
