//! # League Time Feature
//!
//! Pacific wall-clock helpers. League Time is 10 PM to 6 AM in Los Angeles, and all day
//! during summer break (June 20 to September 20).
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

pub mod pacific;

pub use pacific::{is_league_time, pacific_midnight, pacific_offset, start_of_pacific_day, to_pacific};
