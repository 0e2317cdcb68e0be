//! Portal API client and credential manager

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::calendar::Bounds;
use super::models::{EventsResponse, LeaderboardResponse, LoginResponse, PortalEvent, PortalUser};
use crate::core::config::PortalSettings;

/// How often the stored token's expiry is checked
pub const TOKEN_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("portal request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("portal returned an error: {0}")]
    Api(String),

    #[error("portal token is malformed: {0}")]
    MalformedToken(&'static str),

    #[error("not logged in to the portal")]
    NotLoggedIn,
}

fn api_error(error: Option<serde_json::Value>) -> Result<(), PortalError> {
    match error {
        None | Some(serde_json::Value::Null) => Ok(()),
        Some(serde_json::Value::String(message)) => Err(PortalError::Api(message)),
        Some(other) => Err(PortalError::Api(other.to_string())),
    }
}

/// Query string for the leaderboard endpoint. Bounds are Unix seconds.
fn leaderboard_query(limit: u32, bounds: Option<Bounds>) -> Vec<(&'static str, i64)> {
    let mut query = vec![("limit", i64::from(limit))];
    if let Some(bounds) = bounds {
        query.push(("from", bounds.from.timestamp()));
        query.push(("to", bounds.to.timestamp()));
    }
    query
}

/// Expiry time from a JWT's `exp` claim. The signature is not checked; the token comes
/// straight from the portal.
pub fn jwt_expiry(token: &str) -> Result<DateTime<Utc>, PortalError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or(PortalError::MalformedToken("JWT payload for portal API empty"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| PortalError::MalformedToken("JWT payload is not base64url"))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|_| PortalError::MalformedToken("JWT payload is not JSON"))?;

    let exp = claims
        .get("exp")
        .and_then(|v| v.as_i64())
        .ok_or(PortalError::MalformedToken(
            "JWT payload for portal API does not contain expiry date",
        ))?;

    DateTime::from_timestamp(exp, 0).ok_or(PortalError::MalformedToken("JWT expiry out of range"))
}

/// Holds the bot's portal session and keeps it fresh.
pub struct PortalApiManager {
    http: reqwest::Client,
    settings: PortalSettings,
    token: RwLock<Option<String>>,
}

impl PortalApiManager {
    pub fn new(http: reqwest::Client, settings: PortalSettings) -> Self {
        Self {
            http,
            settings,
            token: RwLock::new(None),
        }
    }

    /// Log in with the bot's portal account and store the returned token.
    pub async fn login(&self) -> Result<(), PortalError> {
        let response: LoginResponse = self
            .http
            .post(format!("{}/auth/login", self.settings.url))
            .json(&serde_json::json!({
                "email": self.settings.username,
                "password": self.settings.password,
            }))
            .send()
            .await?
            .json()
            .await?;

        api_error(response.error)?;
        let token = response
            .token
            .ok_or_else(|| PortalError::Api("login response has no token".to_string()))?;

        *self.token.write().await = Some(token);
        info!("Logged in to the membership portal");
        Ok(())
    }

    /// Current bearer token
    pub async fn token(&self) -> Result<String, PortalError> {
        self.token.read().await.clone().ok_or(PortalError::NotLoggedIn)
    }

    /// Whether the stored token expires after `now`
    pub async fn token_valid(&self, now: DateTime<Utc>) -> Result<bool, PortalError> {
        let token = self.token().await?;
        Ok(jwt_expiry(&token)? > now)
    }

    /// Log in again if the token has expired (or was never obtained).
    pub async fn refresh_if_expired(&self, now: DateTime<Utc>) -> Result<bool, PortalError> {
        match self.token_valid(now).await {
            Ok(true) => Ok(false),
            Ok(false) | Err(PortalError::NotLoggedIn) => {
                info!("Membership Portal API token no longer valid! Refreshing.");
                self.login().await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Log in now, then check the token every hour for the life of the process.
    pub fn spawn_token_refresh(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.login().await {
                error!("Initial portal login failed: {e}");
            }

            let mut interval = tokio::time::interval(TOKEN_CHECK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the login above covers it.
            interval.tick().await;

            loop {
                interval.tick().await;
                debug!("Checking Membership Portal API token validity");
                if let Err(e) = self.refresh_if_expired(Utc::now()).await {
                    error!("Portal token refresh failed: {e}");
                }
            }
        })
    }

    /// Events whose end is in the future
    pub async fn future_events(&self) -> Result<Vec<PortalEvent>, PortalError> {
        let token = self.token().await?;
        let response: EventsResponse = self
            .http
            .get(format!("{}/event/future", self.settings.url))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        api_error(response.error)?;
        Ok(response.events)
    }

    /// Leaderboard, highest points first. Without bounds it covers all time.
    pub async fn leaderboard(
        &self,
        limit: u32,
        bounds: Option<Bounds>,
    ) -> Result<Vec<PortalUser>, PortalError> {
        let token = self.token().await?;
        let response: LeaderboardResponse = self
            .http
            .get(format!("{}/leaderboard", self.settings.url))
            .bearer_auth(token)
            .query(&leaderboard_query(limit, bounds))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        api_error(response.error)?;
        Ok(response.leaderboard)
    }

    #[cfg(test)]
    pub(crate) async fn set_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jwt_with(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn manager() -> PortalApiManager {
        PortalApiManager::new(
            reqwest::Client::new(),
            PortalSettings {
                url: "http://127.0.0.1:9".to_string(),
                username: "bot@acmucsd.org".to_string(),
                password: "hunter2".to_string(),
            },
        )
    }

    #[test]
    fn test_jwt_expiry_reads_exp_claim() {
        let token = jwt_with(serde_json::json!({"uuid": "x", "exp": 1_700_000_000}));
        assert_eq!(
            jwt_expiry(&token).unwrap(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn test_jwt_without_exp_is_an_error() {
        let token = jwt_with(serde_json::json!({"uuid": "x"}));
        assert!(matches!(jwt_expiry(&token), Err(PortalError::MalformedToken(_))));
        assert!(matches!(jwt_expiry("garbage"), Err(PortalError::MalformedToken(_))));
    }

    #[test]
    fn test_leaderboard_query_bounds() {
        assert_eq!(leaderboard_query(10, None), vec![("limit", 10)]);

        let bounds = Bounds {
            from: Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2026, 3, 22, 7, 0, 0).unwrap(),
        };
        assert_eq!(
            leaderboard_query(25, Some(bounds)),
            vec![("limit", 25), ("from", 1_767_600_000), ("to", 1_774_162_800)]
        );
    }

    #[test]
    fn test_api_error_field() {
        assert!(api_error(None).is_ok());
        assert!(api_error(Some(serde_json::Value::Null)).is_ok());
        assert!(matches!(
            api_error(Some(serde_json::json!("Invalid credentials"))),
            Err(PortalError::Api(message)) if message == "Invalid credentials"
        ));
    }

    #[tokio::test]
    async fn test_token_validity_against_now() {
        let portal = manager();
        assert!(matches!(portal.token().await, Err(PortalError::NotLoggedIn)));

        let token = jwt_with(serde_json::json!({"exp": 2_000}));
        portal.set_token(&token).await;
        assert!(portal.token_valid(Utc.timestamp_opt(1_000, 0).unwrap()).await.unwrap());
        assert!(!portal.token_valid(Utc.timestamp_opt(3_000, 0).unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_valid_token_is_not_refreshed() {
        let portal = manager();
        portal
            .set_token(&jwt_with(serde_json::json!({"exp": 2_000})))
            .await;
        let refreshed = portal
            .refresh_if_expired(Utc.timestamp_opt(1_000, 0).unwrap())
            .await
            .unwrap();
        assert!(!refreshed);
    }
}
