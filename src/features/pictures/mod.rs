//! # Pictures Feature
//!
//! Random cat, dog and bread pictures from public image APIs.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

pub mod api;

pub use api::{extract_url, fetch_picture, Picture, PictureSource};
