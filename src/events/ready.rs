//! Ready listener: presence and per-guild command schemas

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serenity::model::gateway::Activity;
use serenity::model::id::GuildId;
use serenity::prelude::Context;
use std::sync::Arc;

use super::{BotEvent, EventKind, EventListener};
use crate::commands::registry::CommandRegistry;
use crate::commands::slash::register_guild_commands;
use crate::core::Config;

pub struct ReadyListener {
    config: Arc<Config>,
    registry: Arc<CommandRegistry>,
}

impl ReadyListener {
    pub fn new(config: Arc<Config>, registry: Arc<CommandRegistry>) -> Self {
        Self { config, registry }
    }
}

#[async_trait]
impl EventListener for ReadyListener {
    fn kind(&self) -> EventKind {
        EventKind::Ready
    }

    fn name(&self) -> &'static str {
        "ready"
    }

    async fn handle(&self, ctx: &Context, event: &BotEvent<'_>) -> Result<()> {
        let BotEvent::Ready(ready) = event else {
            return Ok(());
        };

        info!("🎉 {} is connected and ready!", ready.user.tag());
        info!("📡 Connected to {} guilds", ready.guilds.len());
        ctx.set_activity(Activity::playing(&self.config.presence_text)).await;

        // One guild failing to register must not keep the rest stale.
        for guild_id in &self.config.guild_ids {
            if let Err(e) = register_guild_commands(ctx, GuildId(*guild_id), &self.registry).await {
                error!("❌ Failed to register commands for guild {guild_id}: {e:#}");
            }
        }
        Ok(())
    }
}
