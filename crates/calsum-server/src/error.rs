//! Server error types.

use std::io;
use std::time::Duration;

use calsum_providers::ProviderError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while starting or stopping the server.
///
/// Request-time failures never surface here; they are mapped to HTTP
/// responses by the routing layer.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (bind, accept, serve).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Startup failure in the provider chain (credentials, authorization).
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// In-flight connections outlived the shutdown grace period.
    #[error("shutdown grace period of {0:?} elapsed with connections still open")]
    ShutdownTimeout(Duration),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
