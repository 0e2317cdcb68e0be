//! Academic quarters and years for leaderboard bounds
//!
//! The calendar ships with the bot as a JSON table keyed by quarter code (`FA25`) and
//! academic year (`2025-2026`). Dates are Pacific calendar days and the last day of a
//! term counts in full. The table needs a new year appended before the old one runs out.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::features::league_time::pacific_midnight;

const BUNDLED_CALENDAR: &str = include_str!("quarters_and_years.json");

/// e.g. `Thursday, September 25, 2025`
const DATE_FORMAT: &str = "%A, %B %d, %Y";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("academic calendar is malformed: {0}")]
    Malformed(String),

    #[error("no academic {period} in session at {at}")]
    NotInSession {
        period: &'static str,
        at: DateTime<Utc>,
    },
}

/// Time span a leaderboard covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardKind {
    Yearly,
    Quarterly,
    #[default]
    AllTime,
}

impl LeaderboardKind {
    pub const ALL: [LeaderboardKind; 3] = [
        LeaderboardKind::Yearly,
        LeaderboardKind::Quarterly,
        LeaderboardKind::AllTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LeaderboardKind::Yearly => "Yearly",
            LeaderboardKind::Quarterly => "Quarterly",
            LeaderboardKind::AllTime => "All-Time",
        }
    }

    /// Accepts the labels and the short forms `year`, `quarter` and `all`, in any case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "yearly" | "year" => Some(LeaderboardKind::Yearly),
            "quarterly" | "quarter" => Some(LeaderboardKind::Quarterly),
            "all-time" | "alltime" | "all" => Some(LeaderboardKind::AllTime),
            _ => None,
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Half-open interval `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Bounds {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub code: String,
    pub name: String,
    pub bounds: Bounds,
}

#[derive(Deserialize)]
struct RawTerm {
    name: Option<String>,
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct RawCalendar {
    quarters: BTreeMap<String, RawTerm>,
    years: BTreeMap<String, RawTerm>,
}

#[derive(Debug, Clone)]
pub struct AcademicCalendar {
    quarters: Vec<Term>,
    years: Vec<Term>,
}

fn parse_day(code: &str, text: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| CalendarError::Malformed(format!("{code}: '{text}': {e}")))
}

fn terms(raw: BTreeMap<String, RawTerm>) -> Result<Vec<Term>, CalendarError> {
    raw.into_iter()
        .map(|(code, term)| {
            let start = parse_day(&code, &term.start)?;
            let end = parse_day(&code, &term.end)?;
            let from = pacific_midnight(start);
            let to = end.succ_opt().and_then(pacific_midnight);
            let (Some(from), Some(to)) = (from, to) else {
                return Err(CalendarError::Malformed(format!("{code}: dates out of range")));
            };
            if from >= to {
                return Err(CalendarError::Malformed(format!("{code}: ends before it starts")));
            }
            Ok(Term {
                name: term.name.unwrap_or_else(|| code.clone()),
                code,
                bounds: Bounds { from, to },
            })
        })
        .collect()
}

impl AcademicCalendar {
    /// The calendar shipped with the bot
    pub fn bundled() -> Result<Self, CalendarError> {
        Self::from_json(BUNDLED_CALENDAR)
    }

    pub fn from_json(json: &str) -> Result<Self, CalendarError> {
        let raw: RawCalendar =
            serde_json::from_str(json).map_err(|e| CalendarError::Malformed(e.to_string()))?;
        Ok(Self {
            quarters: terms(raw.quarters)?,
            years: terms(raw.years)?,
        })
    }

    pub fn current_quarter(&self, at: DateTime<Utc>) -> Option<&Term> {
        self.quarters.iter().find(|term| term.bounds.contains(at))
    }

    pub fn current_year(&self, at: DateTime<Utc>) -> Option<&Term> {
        self.years.iter().find(|term| term.bounds.contains(at))
    }

    /// Bounds for a leaderboard of `kind` at `at`. All-time leaderboards are unbounded.
    pub fn bounds_for(
        &self,
        kind: LeaderboardKind,
        at: DateTime<Utc>,
    ) -> Result<Option<Bounds>, CalendarError> {
        let term = match kind {
            LeaderboardKind::AllTime => return Ok(None),
            LeaderboardKind::Quarterly => self
                .current_quarter(at)
                .ok_or(CalendarError::NotInSession { period: "quarter", at })?,
            LeaderboardKind::Yearly => self
                .current_year(at)
                .ok_or(CalendarError::NotInSession { period: "year", at })?,
        };
        Ok(Some(term.bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn calendar() -> AcademicCalendar {
        AcademicCalendar::bundled().unwrap()
    }

    #[test]
    fn test_bundled_calendar_parses() {
        let calendar = calendar();
        assert_eq!(calendar.quarters.len(), 15);
        assert_eq!(calendar.years.len(), 5);
    }

    #[test]
    fn test_fall_quarter_starts_at_pacific_midnight() {
        let calendar = calendar();
        // Thursday, September 25, 2025 begins at 07:00 UTC (PDT)
        assert_eq!(calendar.current_quarter(utc(2025, 9, 25, 6, 59, 59)), None);
        assert_eq!(
            calendar.current_quarter(utc(2025, 9, 25, 7, 0, 0)).map(|t| t.code.as_str()),
            Some("FA25")
        );
    }

    #[test]
    fn test_last_day_of_quarter_counts_in_full() {
        let calendar = calendar();
        // Saturday, December 13, 2025 ends at 08:00 UTC on the 14th (PST)
        let fall = calendar.current_quarter(utc(2025, 12, 14, 7, 59, 59)).unwrap();
        assert_eq!(fall.name, "Fall Quarter 2025");
        assert_eq!(calendar.current_quarter(utc(2025, 12, 14, 8, 0, 0)), None);
    }

    #[test]
    fn test_academic_year_covers_summer() {
        let calendar = calendar();
        let summer = utc(2026, 7, 15, 12, 0, 0);
        assert_eq!(calendar.current_quarter(summer), None);
        assert_eq!(calendar.current_year(summer).map(|t| t.code.as_str()), Some("2025-2026"));
        assert_eq!(
            calendar.current_year(utc(2026, 9, 24, 7, 0, 0)).map(|t| t.code.as_str()),
            Some("2026-2027")
        );
    }

    #[test]
    fn test_bounds_for_each_kind() {
        let calendar = calendar();
        let at = utc(2026, 2, 10, 20, 0, 0);
        assert_eq!(calendar.bounds_for(LeaderboardKind::AllTime, at), Ok(None));

        let winter = calendar.bounds_for(LeaderboardKind::Quarterly, at).unwrap().unwrap();
        assert_eq!(winter.from, utc(2026, 1, 5, 8, 0, 0));
        assert_eq!(winter.to, utc(2026, 3, 22, 7, 0, 0));

        let year = calendar.bounds_for(LeaderboardKind::Yearly, at).unwrap().unwrap();
        assert_eq!(year.from, utc(2025, 9, 25, 7, 0, 0));
    }

    #[test]
    fn test_break_has_no_quarter() {
        let at = utc(2025, 12, 25, 12, 0, 0);
        assert_eq!(
            calendar().bounds_for(LeaderboardKind::Quarterly, at),
            Err(CalendarError::NotInSession { period: "quarter", at })
        );
    }

    #[test]
    fn test_malformed_dates_are_rejected() {
        let json = r#"{"quarters": {"FA25": {"start": "Friday, September 25, 2025", "end": "Saturday, December 13, 2025"}}, "years": {}}"#;
        assert!(matches!(
            AcademicCalendar::from_json(json),
            Err(CalendarError::Malformed(_))
        ));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(LeaderboardKind::parse("Quarterly"), Some(LeaderboardKind::Quarterly));
        assert_eq!(LeaderboardKind::parse("year"), Some(LeaderboardKind::Yearly));
        assert_eq!(LeaderboardKind::parse("ALL-TIME"), Some(LeaderboardKind::AllTime));
        assert_eq!(LeaderboardKind::parse("monthly"), None);
        assert_eq!(LeaderboardKind::default().to_string(), "All-Time");
    }
}
