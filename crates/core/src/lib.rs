//! Core business logic for Vitrine.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! File sniffing, watermarking and the delivery rules live here.
//!
//! # Modules
//!
//! - `filetype` - Magic-byte sniffing and MIME categories
//! - `watermark` - PDF and presentation watermarking
//! - `delivery` - Attachment lookup, decoding and delivery

pub mod delivery;
pub mod filetype;
pub mod watermark;

#[cfg(test)]
mod test_support;
