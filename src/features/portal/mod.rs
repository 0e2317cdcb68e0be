//! # Membership Portal Feature
//!
//! Client for the ACM membership portal API: bot login, hourly token refresh, future
//! events for check-in codes, and the points leaderboard over the academic calendar.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: false

pub mod calendar;
pub mod client;
pub mod models;

pub use calendar::{AcademicCalendar, Bounds, CalendarError, LeaderboardKind, Term};
pub use client::{jwt_expiry, PortalApiManager, PortalError, TOKEN_CHECK_INTERVAL};
pub use models::{PortalEvent, PortalUser};
