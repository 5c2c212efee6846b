//! Watermark error types.

use thiserror::Error;

/// Watermark operation errors.
///
/// These never reach API clients: callers fall back to the original file.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// The PDF could not be parsed, modified or saved.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// The presentation package could not be written.
    #[error("package error: {0}")]
    Package(#[from] zip::result::ZipError),

    /// I/O while serializing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document structure is not what a valid file would have.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Options cannot be rendered.
    #[error("invalid watermark options: {0}")]
    InvalidOptions(String),

    /// The worker running the watermark did not complete.
    #[error("watermark task failed: {0}")]
    Task(String),
}

impl WatermarkError {
    /// Create an invalid options error.
    #[must_use]
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    /// Create a malformed document error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
