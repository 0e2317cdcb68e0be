//! # Features Layer
//!
//! Stateful and I/O-heavy building blocks used by the command handlers.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.9.0
//!
//! ## Changelog
//! - 2.0.0: Club bot features (cooldown, ping icon, matchmaking, portal, shortener,
//!   pictures, QR, league time)

pub mod cooldown;
pub mod league_time;
pub mod matchmaking;
pub mod pictures;
pub mod ping_icon;
pub mod portal;
pub mod qr;
pub mod shortener;

pub use cooldown::{Admission, GuildCooldown};
pub use matchmaking::{make_groups, partition, LastRun, MatchError};
pub use ping_icon::{IconStore, PingOutcome, PingTracker};
pub use portal::{PortalApiManager, PortalError, PortalEvent, PortalUser};
pub use shortener::{Shortened, ShortenerError, YourlsClient};
