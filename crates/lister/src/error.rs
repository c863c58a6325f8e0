//! Error types for detection and listing operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for listing operations.
///
/// Every variant is terminal for the listing session that produced it.
#[derive(Debug, Error)]
pub enum ListError {
    /// The input produced no header bytes at all.
    #[error("empty file")]
    EmptyInput,

    /// No registered signature matched the header window.
    #[error("unknown format")]
    UnknownFormat,

    /// A codec failed to open the archive (bad footer, bad stream header, ...).
    #[error("create {format} reader: {message}")]
    AdapterInit {
        /// Name of the detected format
        format: &'static str,
        /// Message reported by the codec
        message: String,
    },

    /// A structural parse failure in the middle of the entry sequence.
    #[error("{format}: malformed entry: {message}")]
    MalformedEntry {
        /// Name of the detected format
        format: &'static str,
        /// Message describing the failure
        message: String,
    },

    /// The signature is recognized but listing is not implemented.
    #[error("{0} format not yet supported")]
    NotSupported(&'static str),

    /// Archive file not found at the specified path.
    #[error("archive not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while peeking or measuring the stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ListError {
    pub(crate) fn init(format: &'static str, err: impl std::fmt::Display) -> Self {
        ListError::AdapterInit {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(format: &'static str, err: impl std::fmt::Display) -> Self {
        ListError::MalformedEntry {
            format,
            message: err.to_string(),
        }
    }
}
