//! YOURLS API calls: `shorturl`, `expand` and `update`

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::core::config::ShortenerSettings;

/// Public base of every short link
pub const SHORT_LINK_BASE: &str = "https://acmurl.com";

/// YOURLS reports a taken keyword with this code
const KEYWORD_TAKEN: &str = "error:keyword";

#[derive(Debug, Error)]
pub enum ShortenerError {
    #[error("short link '{0}' already exists")]
    KeywordExists(String),

    #[error("YOURLS rejected the request: {0}")]
    Rejected(String),

    #[error("YOURLS request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    shorturl: Option<String>,
    #[serde(default)]
    longurl: Option<String>,
}

impl ApiResponse {
    fn failure(&self, keyword: &str) -> Option<ShortenerError> {
        if self.status.as_deref() != Some("fail") {
            return None;
        }
        match self.code.as_deref() {
            Some(KEYWORD_TAKEN) => Some(ShortenerError::KeywordExists(keyword.to_string())),
            code => Some(ShortenerError::Rejected(
                self.message
                    .clone()
                    .or_else(|| code.map(str::to_string))
                    .unwrap_or_else(|| "unknown failure".to_string()),
            )),
        }
    }
}

/// A link that now points somewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortened {
    Created { short_url: String },
    Updated { short_url: String, previous: Option<String> },
}

pub struct YourlsClient {
    http: reqwest::Client,
    settings: ShortenerSettings,
}

impl YourlsClient {
    pub fn new(http: reqwest::Client, settings: ShortenerSettings) -> Self {
        Self { http, settings }
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<ApiResponse, ShortenerError> {
        let mut form = vec![
            ("username", self.settings.username.as_str()),
            ("password", self.settings.password.as_str()),
            ("format", "json"),
        ];
        form.extend_from_slice(params);

        let response = self
            .http
            .post(&self.settings.url)
            .form(&form)
            .send()
            .await?
            .json::<ApiResponse>()
            .await?;
        Ok(response)
    }

    /// Create `keyword` pointing at `long_url`.
    pub async fn shorten(
        &self,
        keyword: &str,
        long_url: &str,
        title: &str,
    ) -> Result<String, ShortenerError> {
        let response = self
            .call(&[
                ("action", "shorturl"),
                ("keyword", keyword),
                ("url", long_url),
                ("title", title),
            ])
            .await?;

        if let Some(err) = response.failure(keyword) {
            return Err(err);
        }
        Ok(response
            .shorturl
            .unwrap_or_else(|| format!("{SHORT_LINK_BASE}/{keyword}")))
    }

    /// Where `keyword` currently points
    pub async fn expand(&self, keyword: &str) -> Result<Option<String>, ShortenerError> {
        let response = self
            .call(&[("action", "expand"), ("shorturl", keyword)])
            .await?;
        Ok(response.longurl)
    }

    /// Point an existing `keyword` at `long_url`.
    pub async fn update(
        &self,
        keyword: &str,
        long_url: &str,
        title: &str,
    ) -> Result<(), ShortenerError> {
        let response = self
            .call(&[
                ("action", "update"),
                ("shorturl", keyword),
                ("url", long_url),
                ("title", title),
            ])
            .await?;

        match response.failure(keyword) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Create the short link, or repoint it when the keyword is already taken.
    pub async fn shorten_or_update(
        &self,
        keyword: &str,
        long_url: &str,
        title: &str,
    ) -> Result<Shortened, ShortenerError> {
        match self.shorten(keyword, long_url, title).await {
            Ok(short_url) => Ok(Shortened::Created { short_url }),
            Err(ShortenerError::KeywordExists(_)) => {
                debug!("Keyword '{keyword}' taken, updating existing link");
                let previous = self.expand(keyword).await?;
                self.update(keyword, long_url, title).await?;
                Ok(Shortened::Updated {
                    short_url: format!("{SHORT_LINK_BASE}/{keyword}"),
                    previous,
                })
            }
            Err(e) => Err(e),
        }
    }
}
