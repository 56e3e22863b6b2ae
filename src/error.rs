use thiserror::Error;

/// Main error type for SSEE
#[derive(Error, Debug)]
pub enum SseeError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding API errors
    #[error("Embedding API error: {0}")]
    Embedding(String),

    /// Threshold outside the provider's valid range
    #[error("Threshold {0} should be between -1.0 and 1.0")]
    InvalidThreshold(f32),

    /// Entity has no pre-computed embedding
    #[error("No embedding for entity: {0}")]
    MissingEmbedding(String),

    /// Two embeddings that cannot be compared
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for SseeError {
    fn from(err: serde_json::Error) -> Self {
        SseeError::Parse(format!("JSON: {}", err))
    }
}

impl From<serde_yaml_ng::Error> for SseeError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        SseeError::Parse(format!("YAML: {}", err))
    }
}

/// Convenient Result type using SseeError
pub type Result<T> = std::result::Result<T, SseeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SseeError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_invalid_threshold_display() {
        let err = SseeError::InvalidThreshold(100.0);
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("between -1.0 and 1.0"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ssee_err: SseeError = io_err.into();
        assert!(matches!(ssee_err, SseeError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let ssee_err: SseeError = json_err.into();
        assert!(matches!(ssee_err, SseeError::Parse(_)));
        assert!(ssee_err.to_string().contains("JSON"));
    }
}
