//! File type detection.
//!
//! Attachments carry no persisted MIME type, so the format is inferred from
//! the payload itself:
//! - Magic-byte sniffing into a [`FileKind`]
//! - MIME to watermark [`FileCategory`] mapping

mod category;
mod kind;

pub use category::{FileCategory, get_file_type};
pub use kind::{FileKind, sniff};
