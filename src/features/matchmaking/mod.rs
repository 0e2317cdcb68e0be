//! # Matchmaking Feature
//!
//! Random pairing of role holders into groups of two, with one group of three when the
//! count is odd.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

pub mod pairing;
pub mod roster;

pub use pairing::{make_groups, partition, shuffle, LastRun, MatchError, THREAD_CREATION_DELAY};
pub use roster::{role_holders, RosterMember, MEMBER_PAGE_SIZE};
