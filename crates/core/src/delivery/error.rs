//! File delivery error types.

use thiserror::Error;
use vitrine_shared::AppError;

/// File delivery errors.
///
/// The `Display` text of the request-level variants is what API clients
/// see in the `error` field.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The `attachmentIndex` parameter was not supplied.
    #[error("Attachment index is required")]
    MissingIndex,

    /// Project id or attachment index is not an integer.
    #[error("Invalid project ID or attachment index")]
    InvalidParameters,

    /// Project does not exist or has no attachments.
    #[error("Project or attachments not found")]
    NotFound,

    /// Attachment index beyond the project's attachment list.
    #[error("Attachment index out of range")]
    IndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Number of attachments on the project.
        len: usize,
    },

    /// Stored attachment has no content.
    #[error("Empty attachment")]
    EmptyAttachment,

    /// Stored attachment is not valid base64.
    #[error("attachment is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl DeliveryError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::MissingIndex
            | DeliveryError::InvalidParameters
            | DeliveryError::IndexOutOfRange { .. }
            | DeliveryError::EmptyAttachment => Self::Validation(err.to_string()),
            DeliveryError::NotFound => Self::NotFound(err.to_string()),
            DeliveryError::Repository(msg) => Self::Database(msg),
            DeliveryError::Decode(_) => Self::Internal(err.to_string()),
        }
    }
}
