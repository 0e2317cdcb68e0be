use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::prelude::*;
use std::sync::Arc;

use breadbot::commands::{ActionManager, CommandContext};
use breadbot::core::Config;
use breadbot::events::Handler;
use breadbot::features::PortalApiManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting BreadBot...");

    let http = reqwest::Client::new();
    let portal = Arc::new(PortalApiManager::new(http.clone(), config.portal.clone()));
    Arc::clone(&portal).spawn_token_refresh();

    let ctx = Arc::new(CommandContext::new(Arc::clone(&config), http, portal));
    let manager = ActionManager::new(ctx);
    let registry = manager.initialize_commands()?;
    let events = manager.initialize_events(registry);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.bot_token, intents)
        .event_handler(Handler::new(Arc::new(events)))
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
