//! Watermark dispatch by file category.

use tracing::debug;

use super::error::WatermarkError;
use super::options::WatermarkOptions;
use super::pdf::add_watermark_to_pdf;
use super::presentation::add_watermark_to_presentation;
use crate::filetype::{FileCategory, get_file_type};

/// Watermark a file according to its MIME type.
///
/// PDFs and presentations are stamped; every other type, and an empty
/// buffer of any type, is returned unchanged.
///
/// # Errors
///
/// Returns an error if the PDF or presentation path fails. Callers are
/// expected to fall back to the original bytes.
pub fn add_watermark_to_file(
    file: &[u8],
    mime_type: &str,
    options: &WatermarkOptions,
) -> Result<Vec<u8>, WatermarkError> {
    if file.is_empty() {
        return Ok(Vec::new());
    }

    let category = get_file_type(mime_type);
    debug!(
        category = category.as_str(),
        mime_type,
        size = file.len(),
        "Applying watermark"
    );

    match category {
        FileCategory::Pdf => add_watermark_to_pdf(file, options),
        FileCategory::Presentation => add_watermark_to_presentation(file, options),
        FileCategory::Other => Ok(file.to_vec()),
    }
}
