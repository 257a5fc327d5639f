use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`PackApi`](super::PackApi) implementation.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout, broken stream...
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    /// The session is missing, invalid or expired.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("API error: status={status}, message={message}")]
    Api { status: u16, message: String },

    /// A success response whose body could not be understood.
    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Failed to read local file {}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
