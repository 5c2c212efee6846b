//! Watermarking categories derived from MIME types.

/// How a file is treated by the watermark applier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// PDF documents get a text overlay on every page.
    Pdf,
    /// Presentations (pptx and ppt).
    Presentation,
    /// Everything else passes through unchanged.
    Other,
}

impl FileCategory {
    /// Convert to a lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Presentation => "presentation",
            Self::Other => "other",
        }
    }
}

/// Map a MIME type (or any string containing one) to a watermark category.
///
/// Matching is substring based, so parameters and `data:` prefixes do not
/// get in the way.
#[must_use]
pub fn get_file_type(mime_type: &str) -> FileCategory {
    let mime = mime_type.to_ascii_lowercase();

    if mime.contains("pdf") {
        return FileCategory::Pdf;
    }

    if ["presentation", "powerpoint", "pptx", "ppt"]
        .iter()
        .any(|token| mime.contains(token))
    {
        return FileCategory::Presentation;
    }

    FileCategory::Other
}
