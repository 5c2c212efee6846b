//! Magic-byte sniffing of attachment payloads.

use std::fmt;

/// Leading bytes of a PDF document.
const PDF_MAGIC: &[u8] = b"%PDF";

/// Leading bytes of a zip container (pptx, docx, xlsx, ...).
const ZIP_MAGIC: &[u8] = b"PK";

/// Leading bytes of an OLE compound file (legacy ppt, doc, xls).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// File format detected from a payload's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// PDF document.
    Pdf,
    /// Zip-based Office document, assumed to be a pptx presentation.
    Pptx,
    /// Legacy OLE Office document, assumed to be a ppt presentation.
    Ppt,
    /// No known signature.
    Unknown,
}

impl FileKind {
    /// Classify a payload by its leading bytes.
    ///
    /// Zip containers cannot be told apart without opening them, so every
    /// `PK` payload is reported as [`FileKind::Pptx`].
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(PDF_MAGIC) {
            Self::Pdf
        } else if bytes.starts_with(ZIP_MAGIC) {
            Self::Pptx
        } else if bytes.starts_with(OLE_MAGIC) {
            Self::Ppt
        } else {
            Self::Unknown
        }
    }

    /// File extension including the leading dot, empty when unknown.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Pptx => ".pptx",
            Self::Ppt => ".ppt",
            Self::Unknown => "",
        }
    }

    /// MIME type sent in the `Content-Type` header.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Ppt => "application/vnd.ms-powerpoint",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Append this kind's extension to a base file name.
    #[must_use]
    pub fn file_name(self, base: &str) -> String {
        format!("{base}{}", self.extension())
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Classify a payload by its leading bytes.
///
/// Shorthand for [`FileKind::sniff`].
#[must_use]
pub fn sniff(bytes: &[u8]) -> FileKind {
    FileKind::sniff(bytes)
}
