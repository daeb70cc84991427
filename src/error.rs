//! Error types for the session layer.
//!
//! Callers of the channel API observe failures only as channel closure;
//! these error values surface on the direct APIs (constructors,
//! [`Session::send`](crate::Session::send)) and in transport implementations.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// I/O failure reported by the transport.
    #[error("I/O error: {0}")]
    Io(String),

    /// Transport collaborator failure that is not plain I/O.
    #[error("transport error: {0}")]
    Transport(String),

    /// A write did not complete within the configured deadline.
    #[error("write deadline exceeded after {elapsed:?}")]
    WriteTimeout {
        /// The deadline that was violated.
        elapsed: Duration,
    },

    /// No pong arrived within the liveness deadline (accept side only).
    #[error("liveness deadline exceeded after {elapsed:?}")]
    LivenessTimeout {
        /// The deadline that was violated.
        elapsed: Duration,
    },

    /// Outbound payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The session has already been torn down.
    #[error("session closed")]
    Closed,

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encode(err.to_string())
    }
}
