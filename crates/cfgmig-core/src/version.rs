//! Comparable configuration versions
//!
//! A [`MigrationVersion`] wraps the raw version text stored in a file and
//! orders it according to its shape:
//! - pure integer (`"3"`) and dotted numeric groups (`"1.2.0"`) compare
//!   component-wise, the shorter side padded with zeros (`1 == 1.0.0`)
//! - anything else is opaque and compares byte-wise
//! - the unversioned marker (no version field) sorts below everything
//!
//! Parsing never fails.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Recognized shape of a version string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionShape {
    /// No version field was present
    Unversioned,
    /// Only digits (`"42"`)
    Integer,
    /// Digit groups separated by dots (`"1.2.0"`)
    Dotted,
    /// Anything else, including the empty string
    Opaque,
}

/// Single component of a numeric version
///
/// Digit groups too large for `u64` are kept as text and compared as
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Component {
    Number(u64),
    Text(String),
}

impl Component {
    fn parse(group: &str) -> Self {
        group
            .parse::<u64>()
            .map_or_else(|_| Self::Text(group.to_string()), Self::Number)
    }

    fn cmp_component(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            // overflowed groups exceed every representable number
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

const ZERO: Component = Component::Number(0);

/// Version token read from a configuration file
#[derive(Debug, Clone)]
pub struct MigrationVersion {
    raw: String,
    shape: VersionShape,
    components: Vec<Component>,
}

impl MigrationVersion {
    /// Parse a version string
    ///
    /// Non-numeric input yields an [`VersionShape::Opaque`] version.
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let is_group = |g: &str| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit());

        let (shape, components) = if is_group(&raw) {
            (VersionShape::Integer, vec![Component::parse(&raw)])
        } else if raw.contains('.') && raw.split('.').all(is_group) {
            (
                VersionShape::Dotted,
                raw.split('.').map(Component::parse).collect(),
            )
        } else {
            (VersionShape::Opaque, Vec::new())
        };

        Self {
            raw,
            shape,
            components,
        }
    }

    /// Marker for a tree without a version field
    #[inline]
    #[must_use]
    pub fn unversioned() -> Self {
        Self {
            raw: String::new(),
            shape: VersionShape::Unversioned,
            components: Vec::new(),
        }
    }

    /// Original version text (empty for the unversioned marker)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> VersionShape {
        self.shape
    }

    #[inline]
    #[must_use]
    pub fn is_unversioned(&self) -> bool {
        self.shape == VersionShape::Unversioned
    }

    /// Check if version is integer or dotted numeric
    #[inline]
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.shape, VersionShape::Integer | VersionShape::Dotted)
    }

    /// Integer value, for integer-shaped versions that fit `u64`
    #[must_use]
    pub fn as_integer(&self) -> Option<u64> {
        match (self.shape, self.components.as_slice()) {
            (VersionShape::Integer, [Component::Number(n)]) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }

    #[inline]
    #[must_use]
    pub fn is_older_than(&self, other: &Self) -> bool {
        self < other
    }

    /// Rank used to order versions of different classes
    fn class(&self) -> u8 {
        match self.shape {
            VersionShape::Unversioned => 0,
            VersionShape::Integer | VersionShape::Dotted => 1,
            VersionShape::Opaque => 2,
        }
    }

    fn cmp_numeric(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).unwrap_or(&ZERO);
                let b = other.components.get(i).unwrap_or(&ZERO);
                a.cmp_component(b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Components without trailing zeros, so `1` and `1.0.0` hash alike
    fn significant_components(&self) -> &[Component] {
        let mut end = self.components.len();
        while end > 0 && self.components[end - 1] == ZERO {
            end -= 1;
        }
        &self.components[..end]
    }
}

impl PartialEq for MigrationVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MigrationVersion {}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.class().cmp(&other.class()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        match self.shape {
            VersionShape::Unversioned => Ordering::Equal,
            VersionShape::Integer | VersionShape::Dotted => self.cmp_numeric(other),
            VersionShape::Opaque => self.raw.as_bytes().cmp(other.raw.as_bytes()),
        }
    }
}

impl Hash for MigrationVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class().hash(state);
        match self.shape {
            VersionShape::Unversioned => {}
            VersionShape::Integer | VersionShape::Dotted => self.significant_components().hash(state),
            VersionShape::Opaque => self.raw.hash(state),
        }
    }
}

impl Display for MigrationVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_unversioned() {
            f.write_str("unversioned")
        } else {
            f.write_str(&self.raw)
        }
    }
}

impl FromStr for MigrationVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for MigrationVersion {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for MigrationVersion {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<u64> for MigrationVersion {
    fn from(version: u64) -> Self {
        Self::parse(version.to_string())
    }
}

impl From<u32> for MigrationVersion {
    fn from(version: u32) -> Self {
        Self::parse(version.to_string())
    }
}
