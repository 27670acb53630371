//! Error types for the core layer.

use std::fmt;

use crate::path::{Path, PathError};

/// Which side of the store an access check was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Write => write!(f, "write"),
        }
    }
}

/// Errors raised by store clients and the utilities built on them.
///
/// Errors are `Clone` because one store failure may have to be delivered
/// to several listeners.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Path validation error.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The store refused the operation.
    #[error("permission denied: {operation} at '/{path}'")]
    PermissionDenied { path: Path, operation: Operation },

    /// The data cannot be stored or interpreted at this path.
    #[error("invalid data at '/{path}': {message}")]
    InvalidData { path: Path, message: String },

    /// The caller asked for something malformed (missing payload, unknown action).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A stored value could not be turned into the requested type.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A Rust value could not be turned into a store value.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// The store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Generic error with message.
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Error::Encode {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }

    /// True for errors that mean "you may not", as opposed to "it broke".
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }
}
