use std::fmt;

use thiserror::Error;

/// Failure classes surfaced by the storage clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Authorization,
    Transient,
    Unknown,
    /// The bucket still held versions after the last verification sweep.
    Incomplete,
    /// The bucket identifier could not be used.
    Config,
}

impl ErrorKind {
    /// Maps an HTTP status to a failure class.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ErrorKind::NotFound,
            401 | 403 => ErrorKind::Authorization,
            408 | 429 | 500..=599 => ErrorKind::Transient,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Transient => "transient",
            ErrorKind::Unknown => "unknown",
            ErrorKind::Incomplete => "incomplete",
            ErrorKind::Config => "config",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct EmptyError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EmptyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
