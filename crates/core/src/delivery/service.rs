//! File delivery service implementation.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::error::DeliveryError;
use super::types::{FileDownload, FileRequest, ProjectAttachments, StoredAttachment};
use crate::filetype::{FileCategory, FileKind, get_file_type};
use crate::watermark::{WatermarkOptions, add_watermark_to_file};

/// Repository trait for reading project attachments.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ProjectRepository: Send + Sync {
    /// Find a project's attachments by project ID.
    fn find_attachments(
        &self,
        project_id: i32,
    ) -> impl std::future::Future<Output = Result<Option<ProjectAttachments>, DeliveryError>> + Send;
}

/// Serves project attachments, optionally watermarked.
pub struct FileDeliveryService<R: ProjectRepository> {
    repo: Arc<R>,
    watermark: Option<WatermarkOptions>,
}

impl<R: ProjectRepository> FileDeliveryService<R> {
    /// Create a delivery service. `None` disables watermarking; requests
    /// asking for it then get the original bytes.
    #[must_use]
    pub fn new(repo: Arc<R>, watermark: Option<WatermarkOptions>) -> Self {
        Self { repo, watermark }
    }

    /// Fetch, decode and optionally watermark one attachment.
    ///
    /// Watermarking never fails the request: if it errors or panics the
    /// original bytes are delivered and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The project is missing or has no attachments
    /// - The index is negative or past the end of the list
    /// - The stored attachment is empty or not base64
    /// - The repository fails
    pub async fn download(&self, request: FileRequest) -> Result<FileDownload, DeliveryError> {
        let project = self
            .repo
            .find_attachments(request.project_id)
            .await?
            .filter(|project| !project.attachments.is_empty())
            .ok_or(DeliveryError::NotFound)?;

        let len = project.attachments.len();
        let index = usize::try_from(request.attachment_index)
            .ok()
            .filter(|index| *index < len)
            .ok_or(DeliveryError::IndexOutOfRange {
                index: request.attachment_index,
                len,
            })?;

        let stored = &project.attachments[index];
        if stored.trim().is_empty() {
            return Err(DeliveryError::EmptyAttachment);
        }

        let decoded = StoredAttachment::decode(stored)?;
        if decoded.bytes.is_empty() {
            return Err(DeliveryError::EmptyAttachment);
        }

        let original = Bytes::from(decoded.bytes);
        let source_kind = FileKind::sniff(&original);
        if let Some(declared) = decoded.declared_mime.as_deref()
            && declared != source_kind.mime_type()
        {
            debug!(
                project_id = project.id,
                declared,
                sniffed = %source_kind,
                "Declared MIME type differs from content"
            );
        }

        let (bytes, watermarked) = match (&self.watermark, request.watermark) {
            (Some(options), true) => apply_watermark(original, source_kind, options).await,
            _ => (original, false),
        };

        let kind = FileKind::sniff(&bytes);
        let file_name = kind.file_name(&format!("attachment_{index}"));

        info!(
            project_id = project.id,
            attachment_index = index,
            kind = %kind,
            size = bytes.len(),
            watermarked,
            "Serving attachment"
        );

        Ok(FileDownload {
            bytes,
            kind,
            file_name,
            watermarked,
        })
    }
}

/// Watermark on the blocking pool, falling back to `original` on failure.
async fn apply_watermark(
    original: Bytes,
    kind: FileKind,
    options: &WatermarkOptions,
) -> (Bytes, bool) {
    if get_file_type(kind.mime_type()) == FileCategory::Other {
        return (original, false);
    }

    let input = original.clone();
    let options = options.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        add_watermark_to_file(&input, kind.mime_type(), &options)
    })
    .await;

    match outcome {
        Ok(Ok(stamped)) => (Bytes::from(stamped), true),
        Ok(Err(e)) => {
            warn!(error = %e, kind = %kind, "Watermarking failed, serving original");
            (original, false)
        }
        Err(e) => {
            warn!(error = %e, kind = %kind, "Watermark task aborted, serving original");
            (original, false)
        }
    }
}
