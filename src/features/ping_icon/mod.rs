//! # Ping Icon Feature
//!
//! Guild icon with a red "pinged" badge whose number grows every time someone runs
//! `everyone`. One run per guild every five minutes, capped at 10000 pings.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

pub mod render;
pub mod tracker;

pub use render::{encode_png, ping_label, png_data_uri, render_ping_icon, ICON_SIZE};
pub use tracker::{IconStore, PingOutcome, PingTracker, EVERYONE_COOLDOWN_MINUTES, PING_CEILING};
