//! Project attachment delivery.
//!
//! This module provides:
//! - Request parsing for the file download endpoint
//! - Base64 attachment decoding
//! - The delivery service with optional watermarking

mod error;
mod service;
mod types;

pub use error::DeliveryError;
pub use service::{FileDeliveryService, ProjectRepository};
pub use types::{FileDownload, FileRequest, ProjectAttachments, StoredAttachment};
