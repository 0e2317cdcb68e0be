//! Utility command handlers
//!
//! Handles: ping, echo, acmurl, qr, report
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: One handler per command; add echo, acmurl, qr and report
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serenity::builder::CreateApplicationCommand;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::{Invocation, Reply, Source};
use crate::commands::slash::{bool_option, string_option};
use crate::core::embeds::{info_embed, link_embed};
use crate::core::errors::{failure_message, report, Interface};
use crate::core::{chunk_for_message, valid_url};
use crate::features::qr::{qr_png, qr_title, slide_png};
use crate::features::shortener::{Shortened, ShortenerError, YourlsClient};

/// Anonymous incident report form
pub const REPORT_FORM_URL: &str = "https://acmurl.com/report";

/// Handler for `ping`. Disabled, so it only answers once someone turns it back on.
pub struct PingHandler {
    descriptor: CommandDescriptor,
}

impl PingHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("ping", prefix)
                .description("Pings the bot.")
                .category(Category::Information)
                .permissions(&[PermissionTag::SendMessages])
                .disabled(),
        }
    }
}

#[async_trait]
impl CommandHandler for PingHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        invocation.say("Pong!").await?;
        Ok(())
    }
}

/// Handler for `echo`: reposts the text as the bot and deletes the trigger.
pub struct EchoHandler {
    descriptor: CommandDescriptor,
}

impl EchoHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("echo", prefix)
                .description("Repeats your message exactly.")
                .usage(prefix, "echo <message>")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages])
                .board_required(),
        }
    }
}

#[async_trait]
impl CommandHandler for EchoHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        string_option(&mut command, "message", "What to say.", true);
        Some(command)
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let Some(text) = invocation.args.rest("message", 0) else {
            invocation
                .whisper(format!("Usage: `{}`", self.descriptor.usage))
                .await?;
            return Ok(());
        };

        match invocation.source {
            Source::Message(msg) => {
                if let Err(e) = msg.delete(invocation.serenity).await {
                    warn!("Could not delete echo trigger {}: {e}", msg.id);
                }
            }
            Source::Interaction(_) => {
                invocation.whisper("Sent!").await?;
            }
        }
        // Slash options can run past the message limit.
        for chunk in chunk_for_message(&text) {
            invocation.channel_id.say(&invocation.serenity.http, chunk).await?;
        }
        Ok(())
    }
}

/// Handler for `acmurl`: creates or repoints an ACMURL short link.
pub struct AcmurlHandler {
    descriptor: CommandDescriptor,
    yourls: YourlsClient,
}

impl AcmurlHandler {
    pub fn new(ctx: &CommandContext) -> Self {
        let prefix = ctx.prefix();
        Self {
            descriptor: CommandDescriptor::new("acmurl", prefix)
                .description("Shortens the provided link into an `ACMURL` link.")
                .usage(prefix, "acmurl <shortlink> <longlink> [description]")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages])
                .board_required(),
            yourls: YourlsClient::new(ctx.http.clone(), ctx.config.shortener.clone()),
        }
    }
}

#[async_trait]
impl CommandHandler for AcmurlHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        string_option(&mut command, "shortlink", "The short link to use (acmurl.com/<shortlink>).", true);
        string_option(&mut command, "longlink", "The link the short link points to.", true);
        string_option(&mut command, "description", "Title of the link in the YOURLS dashboard.", false);
        Some(command)
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let args = &invocation.args;
        let (Some(shortlink), Some(longlink)) =
            (args.string("shortlink", 0), args.string("longlink", 1))
        else {
            invocation
                .say("You must provide both the long link and the short link!")
                .await?;
            return Ok(());
        };

        if !valid_url(&longlink) {
            invocation
                .say("The long link must be a valid HTTP/HTTPS URL!")
                .await?;
            return Ok(());
        }

        let title = args
            .rest("description", 2)
            .unwrap_or_else(|| format!("Discord Bot - {shortlink}"));

        invocation.defer(false).await?;
        match self.yourls.shorten_or_update(&shortlink, &longlink, &title).await {
            Ok(Shortened::Created { short_url }) => {
                info!("Created short link {short_url} -> {longlink}");
                let embed = link_embed(
                    "Set shortened link!",
                    &format!("Short link: {short_url}"),
                    &short_url,
                );
                invocation.edit(Reply::embed(embed)).await?;
            }
            Ok(Shortened::Updated { short_url, previous }) => {
                info!("Repointed short link {short_url} -> {longlink}");
                let previous = previous.unwrap_or_else(|| "(unknown)".to_string());
                let embed = link_embed(
                    "Updated shortened link!",
                    &format!("Short link: {short_url}\nPreviously shortened link: {previous}"),
                    &short_url,
                );
                invocation.edit(Reply::embed(embed)).await?;
            }
            Err(e) => {
                let lead = match e {
                    ShortenerError::KeywordExists(_) => {
                        "An error occurred when attempting to update the short URL."
                    }
                    _ => "An error occurred when shortening the URL.",
                };
                let error_id = report(
                    Interface::Yourls,
                    &format!("Error whilst creating short URL {shortlink}"),
                    &anyhow::Error::new(e),
                );
                invocation.edit(Reply::text(failure_message(lead, error_id))).await?;
            }
        }
        Ok(())
    }
}

/// Handler for `qr`: a QR code image for any text.
pub struct QrHandler {
    descriptor: CommandDescriptor,
}

impl QrHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("qr", prefix)
                .description("Generates a QR code with the provided text in it.")
                .usage(prefix, "qr <text> [title text]")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages, PermissionTag::AttachFiles])
                .board_required(),
        }
    }
}

#[async_trait]
impl CommandHandler for QrHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        string_option(&mut command, "content", "The content to put in the QR code.", true);
        string_option(&mut command, "title", "The title of the QR. If empty, the content is used.", false);
        bool_option(&mut command, "widescreen", "Center the code on a 16:9 slide.");
        Some(command)
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let args = &invocation.args;
        let Some(content) = args.string("content", 0) else {
            invocation
                .say(format!("Usage: `{}`", self.descriptor.usage))
                .await?;
            return Ok(());
        };
        // The text form has no room for a widescreen flag; the title takes the rest.
        let custom_title = args.rest("title", 1);
        let widescreen = matches!(invocation.source, Source::Interaction(_))
            && args.flag("widescreen").unwrap_or(false);

        invocation.defer(false).await?;
        let title = qr_title(&content, custom_title.as_deref());
        let png = if widescreen {
            slide_png(&content)?
        } else {
            qr_png(&content)?
        };

        let embed = info_embed(&title, &format!("Content of QR code: {content}"));
        invocation
            .edit(Reply::embed(embed).with_file("qr.png", png))
            .await?;
        Ok(())
    }
}

/// Handler for `report`: points at the anonymous incident form.
pub struct ReportHandler {
    descriptor: CommandDescriptor,
}

impl ReportHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("report", prefix)
                .description("Report an incident anonymously to ACM's board.")
                .category(Category::Moderation)
                .permissions(&[PermissionTag::SendMessages])
                .board_required(),
        }
    }
}

#[async_trait]
impl CommandHandler for ReportHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        invocation
            .whisper(format!(
                "If you want to report an incident, please use our anonymous Google form: {REPORT_FORM_URL}"
            ))
            .await?;
        Ok(())
    }
}
