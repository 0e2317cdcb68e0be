//! # Cooldown Feature
//!
//! Per-guild cooldown windows with an explicit per-guild lock.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Keyed by guild with next-eligible timestamps and try-lock exclusion
//! - 1.0.0: Initial release with per-user sliding window rate limiting

pub mod limiter;

pub use limiter::{Admission, CooldownPermit, GuildCooldown};
