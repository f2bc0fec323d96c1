//! cfgmig configuration trees
//!
//! Format-agnostic hierarchical key/value store that migration steps mutate.
//!
//! # Core Concepts
//!
//! - [`ConfigTree`]: ordered, dotted-path-addressable tree of [`ConfigValue`]s
//! - [`CommentedConfigTree`]: a tree plus per-path comments that follow moves
//! - [`ConfigPath`]: parsed dotted path (`server.http.port`)
//! - [`MergeStrategy`]: reconciles a loaded tree against defaults
//!
//! # Example
//!
//! ```rust
//! use cfgmig_tree::{ConfigTree, ConfigValue};
//!
//! let mut tree = ConfigTree::new();
//! tree.set("server.port", 8080)?;
//! tree.move_value("server.port", "network.port", false)?;
//! assert_eq!(tree.get("network.port"), Some(&ConfigValue::Integer(8080)));
//! # Ok::<(), cfgmig_tree::TreeError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod commented;
mod error;
mod merge;
mod path;
mod tree;
mod value;

pub use commented::CommentedConfigTree;
pub use error::TreeError;
pub use merge::{merge_missing, MergeStrategy, UnknownStrategy};
pub use path::{ConfigPath, PathError};
pub use tree::ConfigTree;
pub use value::ConfigValue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
