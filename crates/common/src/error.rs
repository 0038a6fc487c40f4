//! Common error types and handling for Colloquy

use std::time::Duration;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Colloquy workspace
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("Remote call timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl Error {
    /// Get the error code for logs and callers that branch on the failure kind
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::RemoteCall(_) => "REMOTE_CALL_FAILED",
            Error::Timeout(_) => "TIMEOUT",
        }
    }
}
