//! YAML codec
//!
//! Encodes top-level entries one at a time so the header and per-key
//! comments can be written above them as `#` lines. Comments on nested
//! paths are not rendered.

use cfgmig_tree::{CommentedConfigTree, ConfigPath, ConfigTree, ConfigValue};

use crate::error::FormatError;
use crate::{write_comment, ConfigFormat};

/// YAML via `serde_yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl ConfigFormat for YamlFormat {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn supports_comments(&self) -> bool {
        true
    }

    fn decode(&self, text: &str) -> Result<CommentedConfigTree, FormatError> {
        let blank = text
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#') || line == "---");
        if blank {
            return Ok(CommentedConfigTree::new());
        }
        let value: ConfigValue =
            serde_yaml::from_str(text).map_err(|e| FormatError::decode(self.name(), e))?;
        match value {
            ConfigValue::Table(tree) => Ok(tree.into()),
            // document holding only `~`
            ConfigValue::Null => Ok(CommentedConfigTree::new()),
            other => Err(FormatError::NotATable {
                format: self.name(),
                found: other.kind(),
            }),
        }
    }

    fn encode(&self, tree: &CommentedConfigTree, header: Option<&str>) -> Result<String, FormatError> {
        let mut out = String::new();
        if let Some(header) = header {
            write_comment(&mut out, header);
            out.push('\n');
        }
        if tree.tree().is_empty() {
            out.push_str("{}\n");
            return Ok(out);
        }

        for (key, value) in tree.tree().iter() {
            if let Some(comment) = tree.comment_at(&ConfigPath::single(key)) {
                write_comment(&mut out, comment);
            }
            let entry: ConfigTree = std::iter::once((key.to_string(), value.clone())).collect();
            let text = serde_yaml::to_string(&entry).map_err(|e| FormatError::encode(self.name(), e))?;
            out.push_str(&text);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_nested_document() {
        let tree = YamlFormat
            .decode("version: 1\nserver:\n  host: localhost\n  ports: [80, 443]\nempty: ~\n")
            .unwrap();
        assert_eq!(tree.get("version"), Some(&ConfigValue::Integer(1)));
        assert_eq!(tree.get("server.host"), Some(&ConfigValue::from("localhost")));
        assert_eq!(
            tree.get("server.ports"),
            Some(&ConfigValue::List(vec![ConfigValue::Integer(80), ConfigValue::Integer(443)]))
        );
        assert_eq!(tree.get("empty"), Some(&ConfigValue::Null));
    }

    #[test]
    fn decode_empty_document() {
        assert!(YamlFormat.decode("").unwrap().tree().is_empty());
        assert!(YamlFormat.decode("# only a comment\n").unwrap().tree().is_empty());
    }

    #[test]
    fn decode_rejects_scalar_root() {
        let err = YamlFormat.decode("just text").unwrap_err();
        assert!(matches!(err, FormatError::NotATable { found: "string", .. }));
    }

    #[test]
    fn encode_with_header_and_comments() {
        let mut tree = CommentedConfigTree::new();
        tree.set("version", 2).unwrap();
        tree.set("name", "app").unwrap();
        tree.set_comment("name", "Display name\nshown in the title").unwrap();

        let text = YamlFormat.encode(&tree, Some("Generated file")).unwrap();
        assert_eq!(
            text,
            "# Generated file\n\nversion: 2\n# Display name\n# shown in the title\nname: app\n"
        );
    }

    #[test]
    fn encoded_text_decodes_to_same_values() {
        let mut tree = CommentedConfigTree::new();
        tree.set("server.port", 8080).unwrap();
        tree.set("server.tls", false).unwrap();
        tree.set("tags", vec![ConfigValue::from("a"), ConfigValue::from("b")]).unwrap();
        tree.set_comment("server", "Listener").unwrap();

        let text = YamlFormat.encode(&tree, None).unwrap();
        let decoded = YamlFormat.decode(&text).unwrap();
        assert_eq!(decoded.tree(), tree.tree());
    }
}
