//! Text watermarking for downloadable documents.
//!
//! This module provides:
//! - PDF overlay (centered text on every page, document info stamping)
//! - Presentation synthesis (single-slide pptx carrying the watermark)
//! - Dispatch by MIME type with pass-through for everything else

mod dispatch;
mod error;
mod metrics;
mod options;
pub(crate) mod pdf;
mod presentation;

pub use dispatch::add_watermark_to_file;
pub use error::WatermarkError;
pub use options::{Rgb, WatermarkOptions};
pub use pdf::add_watermark_to_pdf;
pub use presentation::{PRESENTATION_CAPTION, add_watermark_to_presentation};
