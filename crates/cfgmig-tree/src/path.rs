//! Dotted configuration paths
//!
//! Provides [`ConfigPath`] for hierarchical addressing of values within a
//! [`ConfigTree`](crate::ConfigTree).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path within a configuration tree
///
/// Segments are separated by `.` in textual form. Any non-empty segment is
/// accepted, so keys such as `old-name` or `Server1` address fine.
///
/// # Examples
/// - `["server", "port"]` → `server.port`
/// - `["database", "pool", "max-size"]` → `database.pool.max-size`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path
    ///
    /// # Errors
    /// Returns error if any segment is empty (`a..b`, `.a`, `a.`)
    #[inline]
    pub fn parse(s: &str) -> Result<Self, PathError> {
        s.parse()
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Extend with all segments of another path
    #[inline]
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(other.0.iter().cloned());
        new
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `server` is prefix of `server.port`
    /// - `server` is NOT prefix of `servers.port`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Check if paths overlap (one is prefix of other)
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Get relative path from ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, PathError> {
        if !ancestor.is_prefix_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].to_vec()))
    }

    /// Replace the `from` prefix of this path with `to`
    ///
    /// Returns `None` if `from` is not a prefix of this path.
    #[must_use]
    pub fn rebase(&self, from: &Self, to: &Self) -> Option<Self> {
        self.relative_to(from).ok().map(|rest| to.join(&rest))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for ConfigPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for ConfigPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for ConfigPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for ConfigPath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| (*s).to_string()).collect())
    }
}

impl Default for ConfigPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to configuration paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Not a descendant path
    #[error("path '{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_new_and_segments() {
        let path = ConfigPath::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(path.segments(), &["a", "b"]);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn path_root() {
        let path = ConfigPath::root();
        assert!(path.is_empty());
        assert!(path.parent().is_none());
        assert!(path.last().is_none());
    }

    #[test]
    fn path_parent_and_last() {
        let path = ConfigPath::parse("server.http.port").unwrap();
        assert_eq!(path.parent().unwrap().segments(), &["server", "http"]);
        assert_eq!(path.last(), Some("port"));
    }

    #[test]
    fn path_child_and_join() {
        let base = ConfigPath::single("server");
        assert_eq!(base.child("port").to_string(), "server.port");

        let tail = ConfigPath::parse("http.port").unwrap();
        assert_eq!(base.join(&tail).to_string(), "server.http.port");
    }

    #[test]
    fn path_prefix_relations() {
        let a = ConfigPath::parse("a.b").unwrap();
        let b = ConfigPath::parse("a.b.c").unwrap();
        let c = ConfigPath::parse("a.x").unwrap();

        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(a.is_ancestor_of(&b));
        assert!(!a.is_ancestor_of(&a));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn path_relative_to() {
        let full = ConfigPath::parse("a.b.c.d").unwrap();
        let ancestor = ConfigPath::parse("a.b").unwrap();
        assert_eq!(full.relative_to(&ancestor).unwrap().segments(), &["c", "d"]);

        let other = ConfigPath::parse("x.y").unwrap();
        assert!(matches!(
            full.relative_to(&other),
            Err(PathError::NotDescendant { .. })
        ));
    }

    #[test]
    fn path_rebase() {
        let path = ConfigPath::parse("old.inner.key").unwrap();
        let from = ConfigPath::parse("old").unwrap();
        let to = ConfigPath::parse("new.nested").unwrap();
        assert_eq!(
            path.rebase(&from, &to).unwrap().to_string(),
            "new.nested.inner.key"
        );
        assert!(path.rebase(&to, &from).is_none());
    }

    #[test]
    fn path_from_str_accepts_dashes() {
        let path: ConfigPath = "old-name.sub_key".parse().unwrap();
        assert_eq!(path.segments(), &["old-name", "sub_key"]);
    }

    #[test]
    fn path_from_str_empty_is_root() {
        let path: ConfigPath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_empty_segment() {
        for bad in ["a..b", ".a", "a."] {
            let result: Result<ConfigPath, _> = bad.parse();
            assert!(matches!(result, Err(PathError::EmptySegment(_))), "{bad}");
        }
    }

    #[test]
    fn path_display_roundtrip() {
        let path = ConfigPath::from(&["a", "b", "c"][..]);
        assert_eq!(path.to_string(), "a.b.c");
        assert_eq!(ConfigPath::parse(&path.to_string()).unwrap(), path);
    }
}
