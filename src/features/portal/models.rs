//! Portal API payloads

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Base URL for member-facing portal pages
pub const MEMBERS_SITE: &str = "https://members.acmucsd.com";

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventsResponse {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub events: Vec<PortalEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardResponse {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub leaderboard: Vec<PortalUser>,
}

/// An event as returned by `/event/future`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortalEvent {
    pub uuid: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub community: String,
    pub attendance_code: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PortalEvent {
    /// Whether `at` falls between the event's start and end
    pub fn is_live(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Whether the event starts inside `[from, to)`
    pub fn starts_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        from <= self.start && self.start < to
    }

    /// Express check-in link with the attendance code as a query parameter
    pub fn express_checkin_url(&self) -> String {
        match reqwest::Url::parse_with_params(
            &format!("{MEMBERS_SITE}/checkin"),
            &[("code", self.attendance_code.as_str())],
        ) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{MEMBERS_SITE}/checkin"),
        }
    }
}

/// A leaderboard row
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortalUser {
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub points: i64,
}

impl PortalUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn profile_url(&self) -> String {
        format!("{MEMBERS_SITE}/profile/{}", self.uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> PortalEvent {
        serde_json::from_str(
            r#"{
                "uuid": "a1",
                "title": "Hack Night",
                "attendanceCode": "free pizza&soda",
                "start": "2024-05-01T01:00:00.000Z",
                "end": "2024-05-01T03:00:00.000Z",
                "pointValue": 10
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_event_deserializes_with_missing_optionals() {
        let event = event();
        assert_eq!(event.title, "Hack Night");
        assert_eq!(event.location, "");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_event_live_window() {
        let event = event();
        assert!(event.is_live(Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap()));
        assert!(!event.is_live(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()));
        assert!(!event.is_live(Utc.with_ymd_and_hms(2024, 5, 1, 0, 59, 0).unwrap()));
    }

    #[test]
    fn test_express_checkin_url_escapes_code() {
        let url = event().express_checkin_url();
        assert!(url.starts_with("https://members.acmucsd.com/checkin?code="));
        assert!(!url.contains(' '));
        assert!(url.contains("%26"));
    }

    #[test]
    fn test_user_links() {
        let user: PortalUser = serde_json::from_str(
            r#"{"uuid":"u-1","firstName":"Ada","lastName":"Lovelace","points":1200,"major":"CS"}"#,
        )
        .unwrap();
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert_eq!(user.profile_url(), "https://members.acmucsd.com/profile/u-1");
    }
}
