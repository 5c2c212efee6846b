//! File delivery types and data structures.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;

use super::error::DeliveryError;
use crate::filetype::FileKind;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Attachment list of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAttachments {
    /// Project ID.
    pub id: i32,
    /// Project title.
    pub title: String,
    /// Base64-encoded attachments, in display order.
    pub attachments: Vec<String>,
}

/// A request for one attachment of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRequest {
    /// Project ID.
    pub project_id: i32,
    /// Zero-based attachment index. May be negative as parsed; the service
    /// rejects it as out of range.
    pub attachment_index: i64,
    /// Whether the caller asked for a watermarked copy.
    pub watermark: bool,
}

impl FileRequest {
    /// Build a request from raw route parameters.
    ///
    /// `watermark` is on only for the literal `"true"`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::MissingIndex`] when the index is absent or
    /// empty, and [`DeliveryError::InvalidParameters`] when either number
    /// does not parse.
    pub fn parse(
        project_id: &str,
        attachment_index: Option<&str>,
        watermark: Option<&str>,
    ) -> Result<Self, DeliveryError> {
        let attachment_index = attachment_index
            .filter(|raw| !raw.is_empty())
            .ok_or(DeliveryError::MissingIndex)?;

        let project_id = project_id
            .parse::<i32>()
            .map_err(|_| DeliveryError::InvalidParameters)?;
        let attachment_index = attachment_index
            .parse::<i64>()
            .map_err(|_| DeliveryError::InvalidParameters)?;

        Ok(Self {
            project_id,
            attachment_index,
            watermark: watermark == Some("true"),
        })
    }
}

/// A decoded stored attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    /// MIME type declared by a `data:` URI prefix, if any.
    pub declared_mime: Option<String>,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl StoredAttachment {
    /// Decode an attachment as stored on a project.
    ///
    /// Accepts plain base64 or a `data:<mime>;base64,` URI. Whitespace is
    /// ignored, padding is optional and the URL-safe alphabet is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Decode`] if the payload is not base64.
    pub fn decode(stored: &str) -> Result<Self, DeliveryError> {
        let (declared_mime, payload) = split_data_uri(stored);
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        let bytes = match STANDARD_LENIENT.decode(&compact) {
            Ok(bytes) => bytes,
            Err(standard_err) => URL_SAFE_LENIENT
                .decode(&compact)
                .map_err(|_| DeliveryError::Decode(standard_err))?,
        };

        Ok(Self {
            declared_mime,
            bytes,
        })
    }
}

fn split_data_uri(stored: &str) -> (Option<String>, &str) {
    let trimmed = stored.trim_start();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (None, stored);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return (None, stored);
    };
    let mime = header
        .split(';')
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_lowercase);
    (mime, payload)
}

/// An attachment ready to be sent.
#[derive(Debug, Clone)]
pub struct FileDownload {
    /// Bytes to send.
    pub bytes: Bytes,
    /// Kind sniffed from `bytes`.
    pub kind: FileKind,
    /// Suggested file name, e.g. `attachment_0.pdf`.
    pub file_name: String,
    /// Whether `bytes` carry a watermark.
    pub watermarked: bool,
}

impl FileDownload {
    /// `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    /// `Content-Disposition` header value.
    #[must_use]
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name)
    }
}
