//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Config, HTTP client and portal credentials replace the AI services
//! - 1.0.0: Initial implementation with core shared state

use std::sync::Arc;
use std::time::Instant;

use crate::commands::gate::BoardRole;
use crate::core::Config;
use crate::features::portal::PortalApiManager;

/// Shared context for all command handlers
///
/// Contains the services most handlers need:
/// - Immutable configuration
/// - One HTTP client for every third-party API
/// - Membership portal credentials (kept fresh in the background)
/// - How the board role is identified
/// - Bot start time for uptime tracking
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub portal: Arc<PortalApiManager>,
    pub board: BoardRole,
    pub start_time: Instant,
}

impl CommandContext {
    /// Create a new CommandContext with the given services
    pub fn new(config: Arc<Config>, http: reqwest::Client, portal: Arc<PortalApiManager>) -> Self {
        let board = BoardRole::from_config(config.board_role_id);
        Self {
            config,
            http,
            portal,
            board,
            start_time: Instant::now(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> Arc<CommandContext> {
    let config = Arc::new(crate::core::config::test_config());
    let http = reqwest::Client::new();
    let portal = Arc::new(PortalApiManager::new(http.clone(), config.portal.clone()));
    Arc::new(CommandContext::new(config, http, portal))
}
