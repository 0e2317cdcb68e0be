//! # Link Shortener Feature
//!
//! YOURLS client for ACMURL short links.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

pub mod yourls;

pub use yourls::{ShortenerError, Shortened, YourlsClient, SHORT_LINK_BASE};
