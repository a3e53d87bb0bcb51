//! Error types for the Sprig identification pipeline.
//!
//! Errors are organized by stage so callers can tell which failures are
//! local to one image and which are terminal for the whole request.

use thiserror::Error;

/// Top-level error type for Sprig operations.
#[derive(Error, Debug)]
pub enum SprigError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid or a required credential is missing
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request carried no images at all
    #[error("No images supplied")]
    EmptyBatch,

    /// Upload exceeds the configured size limit
    #[error("Upload too large: {filename} ({size_mb}MB > {max_mb}MB)")]
    UploadTooLarge {
        filename: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// An upload could not be decoded as an image
    #[error("Unsupported image {filename}: {message}")]
    UnsupportedImage { filename: String, message: String },

    /// Every upload in the batch failed normalization
    #[error("None of the {count} uploaded images could be decoded")]
    NoUsableImages { count: usize },

    /// The classification service answered with a non-success status
    #[error("Classifier returned HTTP {status}: {message}")]
    ClassifierHttp { status: u16, message: String },

    /// The classification call failed before a status was received, or the
    /// body could not be parsed
    #[error("Classifier error: {message}")]
    Classifier { message: String },

    /// A single captioning call failed
    #[error("Caption error for {filename}: {message}")]
    Caption {
        filename: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The captioning service could not be reached
    #[error("Caption service unreachable for {filename}: {message}")]
    CaptionUnreachable { filename: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {filename} after {timeout_ms}ms")]
    Timeout {
        filename: String,
        stage: String,
        timeout_ms: u64,
    },
}

impl PipelineError {
    /// HTTP status a caller should answer with when this error ends a request.
    ///
    /// Upstream classifier statuses pass through unchanged.
    pub fn http_status(&self) -> u16 {
        match self {
            PipelineError::EmptyBatch => 400,
            PipelineError::UploadTooLarge { .. } => 413,
            PipelineError::UnsupportedImage { .. } | PipelineError::NoUsableImages { .. } => 422,
            PipelineError::ClassifierHttp { status, .. } => *status,
            PipelineError::Classifier { .. }
            | PipelineError::Caption { .. }
            | PipelineError::CaptionUnreachable { .. } => 502,
            PipelineError::Timeout { .. } => 504,
        }
    }
}

/// Convenience type alias for Sprig results.
pub type Result<T> = std::result::Result<T, SprigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_status_passes_through() {
        let err = PipelineError::ClassifierHttp {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.http_status(), 403);
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_local_errors_map_to_client_statuses() {
        assert_eq!(PipelineError::EmptyBatch.http_status(), 400);
        assert_eq!(PipelineError::NoUsableImages { count: 2 }.http_status(), 422);
        let err = PipelineError::Timeout {
            filename: "leaf.jpg".to_string(),
            stage: "classify".to_string(),
            timeout_ms: 100,
        };
        assert_eq!(err.http_status(), 504);
    }

    #[test]
    fn test_caption_failures_map_to_bad_gateway() {
        let err = PipelineError::CaptionUnreachable {
            filename: "leaf.jpg".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.http_status(), 502);
    }
}
