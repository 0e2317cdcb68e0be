//! US Pacific time without a timezone database
//!
//! Daylight saving runs from 2 AM on the second Sunday of March to 2 AM on the first
//! Sunday of November (rules in force since 2007).

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc,
};

const PST_HOURS: i32 = -8;
const PDT_HOURS: i32 = -7;

const LEAGUE_START_HOUR: u32 = 22;
const LEAGUE_END_HOUR: u32 = 6;

/// Day of `month` that is the `n`th Sunday (1-based)
fn nth_sunday(year: i32, month: u32, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (7 - first.weekday().num_days_from_sunday()) % 7;
    first.checked_add_signed(Duration::days(i64::from(offset + 7 * (n - 1))))
}

fn is_daylight_saving(at: DateTime<Utc>) -> bool {
    let year = at.year();
    // 2 AM local: 10:00 UTC under PST in March, 09:00 UTC under PDT in November
    let start = nth_sunday(year, 3, 2).and_then(|d| d.and_hms_opt(10, 0, 0));
    let end = nth_sunday(year, 11, 1).and_then(|d| d.and_hms_opt(9, 0, 0));
    let (Some(start), Some(end)) = (start, end) else {
        return false;
    };
    Utc.from_utc_datetime(&start) <= at && at < Utc.from_utc_datetime(&end)
}

/// UTC offset in effect in Los Angeles at `at`
pub fn pacific_offset(at: DateTime<Utc>) -> FixedOffset {
    let hours = if is_daylight_saving(at) { PDT_HOURS } else { PST_HOURS };
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

pub fn to_pacific(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.with_timezone(&pacific_offset(at))
}

/// Midnight at the start of the Pacific calendar day containing `at`, in UTC
pub fn start_of_pacific_day(at: DateTime<Utc>) -> DateTime<Utc> {
    let local = to_pacific(at);
    let since_midnight = Duration::seconds(i64::from(local.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(local.nanosecond()));
    at - since_midnight
}

/// Midnight at the start of the Pacific calendar day `date`, in UTC
pub fn pacific_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    // 08:00 UTC is at or just after local midnight and before any 2 AM switch that day
    let before_switch = Utc.from_utc_datetime(&date.and_hms_opt(8, 0, 0)?);
    pacific_offset(before_switch)
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

fn is_summer(local: &DateTime<FixedOffset>) -> bool {
    let (month, day) = (local.month(), local.day());
    match month {
        6 => day >= 20,
        7 | 8 => true,
        9 => day < 20,
        _ => false,
    }
}

/// Whether it is League Time in Los Angeles at `at`
pub fn is_league_time(at: DateTime<Utc>) -> bool {
    let local = to_pacific(at);
    if is_summer(&local) {
        return true;
    }
    local.hour() >= LEAGUE_START_HOUR || local.hour() < LEAGUE_END_HOUR
}
