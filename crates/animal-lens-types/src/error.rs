//! Error types for animal-lens

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    /// The picked image could not be turned into a processable bitmap.
    #[error("Unable to convert image {path}: {reason}")]
    Conversion { path: String, reason: String },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Labels error: {0}")]
    Labels(String),

    #[error("Failed to perform classification: {0}")]
    Submission(String),

    #[error("Capture failed: {0}")]
    Capture(String),
}

impl Error {
    /// Whether this error is an unrecoverable precondition violation.
    ///
    /// Front-ends abort the process on fatal errors instead of reporting
    /// them in the result label.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Conversion { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conversion_is_fatal() {
        let conversion = Error::Conversion {
            path: "cat.jpg".to_string(),
            reason: "truncated".to_string(),
        };
        assert!(conversion.is_fatal());
        assert!(!Error::Submission("empty image".to_string()).is_fatal());
        assert!(!Error::Model("bad graph".to_string()).is_fatal());
        assert!(!Error::Capture("spawn".to_string()).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::Submission("image has no pixels".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to perform classification: image has no pixels"
        );

        let err = Error::Config(ConfigError::NotFound);
        assert_eq!(
            err.to_string(),
            "Configuration error: Configuration directory not found"
        );
    }
}
