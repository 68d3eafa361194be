//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),

    #[error("Extension '{ext}' is not accepted by processor '{processor_id}'")]
    ExtensionNotAccepted { processor_id: String, ext: String },

    #[error("Malformed options JSON: {0}")]
    MalformedOptions(String),

    #[error("Option '{field}' out of range: {message}")]
    DimensionOutOfRange { field: String, message: String },

    #[error("Result not available: job is not completed")]
    MissingResult,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Processing failed: {0}")]
    ProcessingFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
