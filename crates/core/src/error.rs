//! Error types for djupload-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for djupload-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for djupload-core
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid combination (or absence) of path arguments
    #[error("{0}")]
    Usage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential file exists but could not be decoded
    #[error("Invalid credential file {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// Archive could not be written or read back
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// No HTTP response was obtained
    #[error("{0}")]
    Transport(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Shorthand for a [`Error::Usage`] built from any message.
    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    /// Whether this error means no response was received from the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(with_sources(&err))
        }
    }
}

/// `err` followed by each of its causes, e.g.
/// `error sending request: client error (Connect): Connection refused`
fn with_sources(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
