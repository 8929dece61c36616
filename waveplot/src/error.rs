//! Error types for the waveplot crate
//!
//! Local pipeline failures (decode, allocation, misuse) and sync failures
//! (transport, protocol, rejection) share one enum so callers can match on
//! the kind and decide whether a retry makes sense. Nothing here retries.

use thiserror::Error;

/// WavePlot error type
#[derive(Debug, Error)]
pub enum Error {
    /// Audio file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Decoder could not open or decode the file; message is the decoder's own
    #[error("Failed to decode audio: {0}")]
    DecodeFailure(String),

    /// Allocation failed while accumulating decoded data
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Operation invoked without its prerequisite state (programming error)
    #[error("Precondition violated: {0}")]
    PreconditionViolation(&'static str),

    /// Registry has no waveplot with the requested identifier
    #[error("WavePlot not found: {0}")]
    NotFound(String),

    /// Network-level failure talking to the registry
    #[error("Transport error during {operation}: {message}")]
    TransportError {
        operation: &'static str,
        message: String,
    },

    /// Registry response body was not the expected structured data
    #[error("Malformed response during {operation}: {message}")]
    ProtocolError {
        operation: &'static str,
        message: String,
    },

    /// Registry declined the request
    #[error("{operation} rejected with status {status}: {message}")]
    Rejected {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// waveplot-common error (configuration, I/O)
    #[error("Common error: {0}")]
    Common(#[from] waveplot_common::Error),
}

impl Error {
    pub(crate) fn protocol(operation: &'static str, message: impl Into<String>) -> Self {
        Error::ProtocolError {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Error::TransportError {
            operation,
            message: message.into(),
        }
    }
}

/// Result type for WavePlot operations
pub type Result<T> = std::result::Result<T, Error>;
