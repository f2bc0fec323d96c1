//! cfgmig format codecs
//!
//! Converts configuration files to and from [`CommentedConfigTree`]s, and
//! trees to and from typed values.
//!
//! # Core Concepts
//!
//! - [`ConfigFormat`]: one text format (`decode` / `encode` with optional header)
//! - [`FormatRegistry`]: picks a codec from a file extension
//! - [`bind`] / [`unbind`]: typed value <-> tree, through `serde`
//!
//! # Example
//!
//! ```rust
//! use cfgmig_format::{ConfigFormat, YamlFormat};
//!
//! let tree = YamlFormat.decode("version: 1\nname: app\n")?;
//! assert_eq!(tree.get("name").and_then(|v| v.as_str()), Some("app"));
//!
//! let text = YamlFormat.encode(&tree, Some("Managed by cfgmig"))?;
//! assert!(text.starts_with("# Managed by cfgmig\n"));
//! # Ok::<(), cfgmig_format::FormatError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use std::path::Path;

use cfgmig_tree::CommentedConfigTree;

mod binder;
mod error;
mod json;
mod registry;
mod toml;
mod yaml;

pub use binder::{bind, unbind};
pub use error::FormatError;
pub use json::JsonFormat;
pub use registry::FormatRegistry;
pub use self::toml::TomlFormat;
pub use yaml::YamlFormat;

/// A text format for configuration files
///
/// Implement this trait to add support for new file formats.
pub trait ConfigFormat: Send + Sync {
    /// Short lowercase name
    fn name(&self) -> &'static str;

    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str];

    /// Parse text into a tree
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the text is malformed or its root is not a table.
    fn decode(&self, text: &str) -> Result<CommentedConfigTree, FormatError>;

    /// Render a tree, with an optional file-level header
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Encode`] if the tree cannot be represented.
    fn encode(&self, tree: &CommentedConfigTree, header: Option<&str>) -> Result<String, FormatError>;

    /// Whether header and comments survive `encode`
    fn supports_comments(&self) -> bool {
        false
    }

    /// Check if this codec handles the given path
    fn can_handle(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions().iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Write `text` as `#` comment lines
pub(crate) fn write_comment(out: &mut String, text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            out.push_str("#\n");
        } else {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
