//! Process configuration
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Immutable `Config` built once from the environment, typed `ConfigError`
//! - 1.0.0: Initial environment loading

#[cfg(test)]
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORTAL_API_URL: &str = "https://api.acmucsd.com/api/v2";
const DEFAULT_ACMURL_API_URL: &str = "https://acmurl.com/yourls-api.php";
const DEFAULT_GUILD_ICON_DIR: &str = "guild_pics";
const DEFAULT_PRESENCE_TEXT: &str = "ACM Store Demo";

/// Errors raised while building the configuration. All of them are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {var} ({label})")]
    Missing { var: &'static str, label: &'static str },

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// What to do when two commands claim the same name or alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Abort startup with `RegistryError::Duplicate`
    Fail,
    /// Keep the handler registered last, with a warning
    LastWins,
}

/// Membership portal credentials
#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// YOURLS (ACMURL) credentials
#[derive(Debug, Clone)]
pub struct ShortenerSettings {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Third-party picture API keys
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub cat_api: Option<String>,
    pub unsplash: Option<String>,
}

/// Immutable bot configuration, shared as `Arc<Config>`.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub prefix: String,
    pub client_id: u64,
    pub maintainer_id: Option<u64>,
    pub board_role_id: Option<u64>,
    pub match_role_id: Option<u64>,
    pub guild_ids: Vec<u64>,
    pub api_keys: ApiKeys,
    pub shortener: ShortenerSettings,
    pub portal: PortalSettings,
    pub guild_icon_dir: PathBuf,
    pub presence_text: String,
    pub duplicate_policy: DuplicatePolicy,
    pub log_level: String,
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build the configuration from any key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |var: &'static str, label: &'static str| {
            get(var).ok_or(ConfigError::Missing { var, label })
        };

        let bot_token = require("BOT_TOKEN", "Bot Token")?;
        let prefix = require("BOT_PREFIX", "Bot Prefix")?;
        let client_id = parse_id("CLIENT_ID", &require("CLIENT_ID", "App Client ID")?)?;
        let acmurl_username = require("ACMURL_USERNAME", "ACMURL Username")?;
        let acmurl_password = require("ACMURL_PASSWORD", "ACMURL Password")?;
        let portal_username =
            require("MEMBERSHIP_PORTAL_API_USERNAME", "Membership Portal API Username")?;
        let portal_password =
            require("MEMBERSHIP_PORTAL_API_PASSWORD", "Membership Portal API Password")?;
        let guild_ids = parse_guild_ids(&require("DISCORD_GUILD_IDS", "Discord Guild ID List")?)?;

        let optional_id = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            get(var).map(|v| parse_id(var, &v)).transpose()
        };

        let duplicate_policy = match get("DUPLICATE_COMMAND_POLICY").as_deref() {
            None | Some("fail") => DuplicatePolicy::Fail,
            Some("last-wins") => DuplicatePolicy::LastWins,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "DUPLICATE_COMMAND_POLICY",
                    reason: format!("expected 'fail' or 'last-wins', got '{other}'"),
                })
            }
        };

        Ok(Self {
            bot_token,
            prefix,
            client_id,
            maintainer_id: optional_id("MAINTAINER_USER_ID")?,
            board_role_id: optional_id("BOARD_ROLE_ID")?,
            match_role_id: optional_id("MATCH_ROLE_ID")?,
            guild_ids,
            api_keys: ApiKeys {
                cat_api: get("CAT_API_KEY"),
                unsplash: get("UNSPLASH_ACCESS_KEY"),
            },
            shortener: ShortenerSettings {
                url: get("ACMURL_API_URL").unwrap_or_else(|| DEFAULT_ACMURL_API_URL.to_string()),
                username: acmurl_username,
                password: acmurl_password,
            },
            portal: PortalSettings {
                url: get("PORTAL_API_URL")
                    .unwrap_or_else(|| DEFAULT_PORTAL_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                username: portal_username,
                password: portal_password,
            },
            guild_icon_dir: PathBuf::from(
                get("GUILD_ICON_DIR").unwrap_or_else(|| DEFAULT_GUILD_ICON_DIR.to_string()),
            ),
            presence_text: get("PRESENCE_TEXT")
                .unwrap_or_else(|| DEFAULT_PRESENCE_TEXT.to_string()),
            duplicate_policy,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_id(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("'{value}' is not a snowflake id: {e}"),
    })
}

/// `DISCORD_GUILD_IDS` is a JSON array; ids may be strings or bare numbers.
fn parse_guild_ids(value: &str) -> Result<Vec<u64>, ConfigError> {
    let var = "DISCORD_GUILD_IDS";
    let raw: Vec<serde_json::Value> = serde_json::from_str(value).map_err(|e| {
        ConfigError::Invalid {
            var,
            reason: format!("expected a JSON array: {e}"),
        }
    })?;

    raw.iter()
        .map(|entry| match entry {
            serde_json::Value::String(s) => parse_id(var, s),
            serde_json::Value::Number(n) => n.as_u64().ok_or_else(|| ConfigError::Invalid {
                var,
                reason: format!("{n} is not a snowflake id"),
            }),
            other => Err(ConfigError::Invalid {
                var,
                reason: format!("unexpected entry {other}"),
            }),
        })
        .collect()
}

/// One variable from the process environment. Values that are not valid Unicode count as absent.
fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let vars = base_vars();
    Config::from_lookup(|k| vars.get(k).cloned()).expect("test config")
}

#[cfg(test)]
fn base_vars() -> HashMap<String, String> {
    [
        ("BOT_TOKEN", "token"),
        ("BOT_PREFIX", "!"),
        ("CLIENT_ID", "1000"),
        ("ACMURL_USERNAME", "acm"),
        ("ACMURL_PASSWORD", "secret"),
        ("MEMBERSHIP_PORTAL_API_USERNAME", "bot@acmucsd.org"),
        ("MEMBERSHIP_PORTAL_API_PASSWORD", "hunter2"),
        ("DISCORD_GUILD_IDS", r#"["111", 222]"#),
        ("MAINTAINER_USER_ID", "42"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
