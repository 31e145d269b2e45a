//! Error taxonomy for dissociation-time extraction and bootstrap estimation

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the tramd library
#[derive(Error, Debug)]
pub enum TramdError {
    /// An argument was outside its accepted domain (never silently corrected)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line looked like input but could not be interpreted
    #[error("Cannot parse {}:{line}: {content:?}", .path.display())]
    ParseAmbiguity {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Bootstrap cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Plot rendering failed: {0}")]
    Plot(String),

    #[error("Cannot serialize summary: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TramdError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TramdError::InvalidArgument(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TramdError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TramdError>;
