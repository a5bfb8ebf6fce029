//! Error types for the portcullis-shell crate.

use portcullis_core::GatewayError;
use portcullis_protocol::ProtocolError;

/// Errors raised while composing windows and session handlers.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Session handlers may only be installed once per process.
    #[error("Session handlers already installed")]
    SessionAlreadyInstalled,

    /// The host runtime rejected an operation.
    #[error("Host error: {0}")]
    Host(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
