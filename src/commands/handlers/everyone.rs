//! Ping-everyone joke handler
//!
//! Handles: everyone
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use log::{debug, info};
use serenity::builder::CreateApplicationCommand;
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::errors::{failure_message, report, Interface};
use crate::core::file_utils::{download_file, DISCORD_UPLOAD_LIMIT};
use crate::features::ping_icon::{
    encode_png, png_data_uri, render_ping_icon, IconStore, PingOutcome, PingTracker, ICON_SIZE,
};

const TOO_SOON: &str = "Just give it a few minutes; we don't want too many pings.";

/// Guild icons read from and written back to the platform, with the untouched
/// original kept on disk as `<dir>/<guild id>.png`.
pub struct DiscordIcons {
    http: Arc<Http>,
    client: reqwest::Client,
    dir: PathBuf,
}

impl DiscordIcons {
    pub fn new(http: Arc<Http>, client: reqwest::Client, dir: PathBuf) -> Self {
        Self { http, client, dir }
    }

    fn base_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.png"))
    }
}

/// Ask the CDN for PNG whatever format the icon hash URL names.
pub fn png_icon_url(url: &str) -> String {
    let url = url.split('?').next().unwrap_or(url);
    match url.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => format!("{stem}.png?size=1024"),
        _ => format!("{url}.png?size=1024"),
    }
}

#[async_trait]
impl IconStore for DiscordIcons {
    async fn backup(&self, guild_id: u64) -> Result<bool> {
        let guild = GuildId(guild_id).to_partial_guild(&self.http).await?;
        let Some(icon_url) = guild.icon_url() else {
            return Ok(false);
        };

        let file = download_file(&self.client, &png_icon_url(&icon_url), DISCORD_UPLOAD_LIMIT).await?;
        let icon = image::load_from_memory(&file.bytes)
            .context("guild icon is not a readable image")?
            .resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Triangle);

        let mut png = Cursor::new(Vec::new());
        icon.write_to(&mut png, image::ImageFormat::Png)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.base_path(guild_id), png.into_inner()).await?;
        debug!("Saved icon backup for guild {guild_id}");
        Ok(true)
    }

    async fn publish(&self, guild_id: u64, count: u32) -> Result<()> {
        let base = tokio::fs::read(self.base_path(guild_id))
            .await
            .with_context(|| format!("no icon backup for guild {guild_id}"))?;
        let base = image::load_from_memory(&base)?;
        let png = encode_png(&render_ping_icon(&base, count))?;
        let uri = png_data_uri(&png);

        GuildId(guild_id)
            .edit(&self.http, |guild| guild.icon(Some(&uri)))
            .await?;
        info!("April Fool's Prank: guild {guild_id} icon now shows {count} ping(s)");
        Ok(())
    }
}

/// User-facing reply for a ping outcome
pub fn outcome_message(outcome: &PingOutcome) -> String {
    match outcome {
        PingOutcome::Pinged(_) => "🤨".to_string(),
        PingOutcome::TooSoon { eligible_at } => {
            format!("{TOO_SOON} Try again <t:{}:R>.", eligible_at.timestamp())
        }
        PingOutcome::Busy => TOO_SOON.to_string(),
        PingOutcome::NoIcon => "Guess this place has no custom icon. Sorry, can't ping.".to_string(),
        PingOutcome::Exhausted => "Y'all have pinged enough 👀".to_string(),
    }
}

pub struct EveryoneHandler {
    descriptor: CommandDescriptor,
    tracker: PingTracker,
    icon_dir: PathBuf,
}

impl EveryoneHandler {
    pub fn new(prefix: &str, icon_dir: PathBuf) -> Self {
        Self {
            descriptor: CommandDescriptor::new("everyone", prefix)
                .description("Ping everyone. Or rather, the server icon.")
                .category(Category::Jokes)
                .permissions(&[PermissionTag::SendMessages]),
            tracker: PingTracker::new(),
            icon_dir,
        }
    }
}

#[async_trait]
impl CommandHandler for EveryoneHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let Some(guild_id) = invocation.guild_id else {
            invocation.say("I can't change icons here, sorry.").await?;
            return Ok(());
        };

        invocation.defer(false).await?;
        let icons = DiscordIcons::new(
            invocation.serenity.http.clone(),
            ctx.http.clone(),
            self.icon_dir.clone(),
        );

        let message = match self.tracker.ping(guild_id.0, chrono::Utc::now(), &icons).await {
            Ok(outcome) => {
                debug!("everyone in guild {guild_id}: {outcome:?}");
                outcome_message(&outcome)
            }
            Err(e) => {
                let error_id = report(
                    Interface::GuildIcon,
                    &format!("Error whilst changing the icon of guild {guild_id}"),
                    &e,
                );
                failure_message("Couldn't change the icon this time.", error_id)
            }
        };
        invocation.say(message).await?;
        Ok(())
    }
}
