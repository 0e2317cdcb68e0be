//! Embed builders for bot responses
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Replace persona styling with the bot's blue information style
//! - 1.0.0: Extracted from duplicate implementations across handlers

use crate::core::truncate_for_embed;
use serenity::builder::CreateEmbed;

/// Accent color shared by help, shortener and QR embeds
pub const INFO_COLOR: u32 = 0x3498DB;

/// Title + description embed in the information style.
pub fn info_embed(title: &str, description: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title(title);
    embed.description(truncate_for_embed(description));
    embed.color(INFO_COLOR);
    embed
}

/// Information embed whose title links to `url`.
pub fn link_embed(title: &str, description: &str, url: &str) -> CreateEmbed {
    let mut embed = info_embed(title, description);
    embed.url(url);
    embed
}
