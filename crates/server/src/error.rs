//! Server error types

use thiserror::Error;

/// Errors surfaced by the TCP front end
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not bind its address
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener tried to bind
        addr: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The pre-bind probe found the configured port taken
    #[error("{addr} is not available: {source}")]
    PortUnavailable {
        /// Address the probe tried to bind
        addr: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Connection-level I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A reply could not be encoded
    #[error("failed to encode reply: {0}")]
    Encode(String),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
