//! Codec lookup by file extension

use std::path::Path;

use crate::json::JsonFormat;
use crate::toml::TomlFormat;
use crate::yaml::YamlFormat;
use crate::ConfigFormat;

/// Ordered set of codecs; the first codec claiming an extension wins
pub struct FormatRegistry {
    formats: Vec<Box<dyn ConfigFormat>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("format_count", &self.formats.len())
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl FormatRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { formats: Vec::new() }
    }

    /// Registry with the JSON, YAML and TOML codecs
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonFormat);
        registry.register(YamlFormat);
        registry.register(TomlFormat);
        registry
    }

    /// Register a codec
    pub fn register<F: ConfigFormat + 'static>(&mut self, format: F) {
        tracing::debug!("Registered {} format ({})", format.name(), format.extensions().join(", "));
        self.formats.push(Box::new(format));
    }

    /// Find codec for path by its extension
    #[must_use]
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn ConfigFormat> {
        self.formats.iter().find(|f| f.can_handle(path)).map(|f| &**f)
    }

    /// Find codec by name (`"json"`, `"yaml"`, `"toml"`)
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&dyn ConfigFormat> {
        self.formats
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .map(|f| &**f)
    }

    /// Get all registered extensions
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.formats
            .iter()
            .flat_map(|f| f.extensions())
            .copied()
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
