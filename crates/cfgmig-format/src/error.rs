//! Error types for codecs and the binder

/// Errors while converting between text, trees and typed values
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Input text is not valid for the format
    #[error("invalid {format}: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    /// Tree could not be rendered in the format
    #[error("cannot encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    /// Document root is not a key/value table
    #[error("{format} document root is a {found}, expected a table")]
    NotATable {
        format: &'static str,
        found: &'static str,
    },

    /// No codec registered for the file extension
    #[error("no codec registered for extension: '{0}'")]
    NoCodecForExtension(String),

    /// Tree does not match the typed value, or the value is not a table
    #[error("binding failed: {0}")]
    Bind(String),
}

impl FormatError {
    /// Create decode error
    pub fn decode(format: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            format,
            message: message.to_string(),
        }
    }

    /// Create encode error
    pub fn encode(format: &'static str, message: impl ToString) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    /// Check if error came from malformed input
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::NotATable { .. })
    }
}
