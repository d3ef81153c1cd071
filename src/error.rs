//! Error types for document operations

use thiserror::Error;

/// Main error type for document operations
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid container shape: {0}")]
    InvalidShape(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DocumentError {
    /// Whether the error describes a malformed container rather than a
    /// transport or codec failure.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            DocumentError::MissingField(_) | DocumentError::InvalidShape(_)
        )
    }

    /// Whether the error came from a compression or binary-to-text codec.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            DocumentError::Compression(_)
                | DocumentError::Decompression(_)
                | DocumentError::Encoding(_)
        )
    }
}

/// Specialized Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for DocumentError {
    fn from(err: base64::DecodeError) -> Self {
        DocumentError::Encoding(err.to_string())
    }
}

impl From<std::str::Utf8Error> for DocumentError {
    fn from(err: std::str::Utf8Error) -> Self {
        DocumentError::Encoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(DocumentError::MissingField("opts".into()).is_shape_error());
        assert!(DocumentError::Decompression("bad".into()).is_codec_error());
        assert!(!DocumentError::NotFound("x".into()).is_shape_error());
        assert!(!DocumentError::NotFound("x".into()).is_codec_error());
    }

    #[test]
    fn test_display() {
        let err = DocumentError::MissingField("opts".to_string());
        assert_eq!(err.to_string(), "Missing required field: opts");
    }
}
