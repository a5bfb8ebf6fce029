//! Error types for the portcullis-core crate.

/// Core error type for the security gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The configured development origin is unusable.
    #[error("Invalid development origin: {0}")]
    InvalidDevOrigin(String),

    /// Handing a URL to the system browser failed.
    #[error("External open failed: {0}")]
    ExternalOpen(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
