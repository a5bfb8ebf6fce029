//! Error types for the portcullis-protocol crate.

/// Errors raised while resolving an `app://` request.
///
/// None of these escape [`crate::ProtocolResourceServer::resolve`]; each maps
/// to an HTTP status via [`ProtocolError::status`].
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The request URL could not be parsed
    #[error("Invalid request URL '{0}'")]
    InvalidUrl(String),

    /// The request used a scheme other than the packaged-resource scheme
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// No file or route exists for the path
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resolved path escaped the output root
    #[error("Path '{0}' is outside the output root")]
    OutsideRoot(String),

    /// Service-route parameter validation failed
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Writing to the log sink failed
    #[error("Log write failed: {0}")]
    LogWrite(std::io::Error),

    /// I/O error during resolution
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// HTTP status reported to the content view.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidParameters(_) => 400,
            Self::LogWrite(_) => 500,
            Self::InvalidUrl(_)
            | Self::UnsupportedScheme(_)
            | Self::NotFound(_)
            | Self::OutsideRoot(_)
            | Self::Io(_) => 404,
        }
    }
}
