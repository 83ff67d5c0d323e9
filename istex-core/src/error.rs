//! Error types for the LoadIstex utilities

use thiserror::Error;

/// Captured output of an external process, attached to process errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessLogs {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] mustache::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Process error: {message}")]
    Process {
        message: String,
        code: Option<i32>,
        logs: ProcessLogs,
    },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
