//! # QR Feature
//!
//! PNG QR codes for arbitrary text and for event express check-in links, either as a
//! square image or centred on a 16:9 presentation slide.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

pub mod render;

pub use render::{qr_png, qr_title, slide_png, TITLE_LIMIT};
