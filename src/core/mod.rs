//! # Core Module
//!
//! Configuration, error reporting, validators and response helpers shared by every layer.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.7.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add errors and validation modules, immutable config with typed errors
//! - 1.1.0: Add response module with Discord message chunking utilities
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod embeds;
pub mod errors;
pub mod file_utils;
pub mod response;
pub mod validation;

pub use config::{Config, ConfigError, DuplicatePolicy};
pub use errors::{
    classify_platform_error, failure_message, report, Interface, PlatformFailure, RenderError,
};
pub use response::{chunk_for_message, chunk_text, ellipsize, truncate_for_embed, EMBED_LIMIT, MESSAGE_LIMIT};
pub use validation::{valid_number, valid_url};
