//! Error types for mdocx library.

use std::io;
use thiserror::Error;

/// Result type alias for mdocx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rendering or exporting documents.
///
/// Unresolvable images and malformed markup are not errors: they degrade to
/// literal text inside the document. Only the final serialization step can
/// fail an export.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error writing the DOCX zip package.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error reading or writing JSON (records, block dumps).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An option value is out of range or inconsistent.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The binary writer failed; no partial document is returned.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// The export did not finish within the caller's deadline.
    #[error("Export timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap any writer fault into the single export failure reported to callers.
    pub fn export_failed(err: impl std::fmt::Display) -> Self {
        Error::ExportFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ExportFailed("disk full".to_string());
        assert_eq!(err.to_string(), "Export failed: disk full");

        let err = Error::InvalidOption("image width must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid option: image width must be positive"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_export_failed_wraps_source() {
        let io_err = io::Error::new(io::ErrorKind::Other, "broken pipe");
        let err = Error::export_failed(Error::Io(io_err));
        assert!(matches!(err, Error::ExportFailed(ref msg) if msg.contains("broken pipe")));
    }
}
