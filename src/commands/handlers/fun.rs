//! Social command handlers
//!
//! Handles: coverup, kudos, ucsd
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serenity::builder::CreateApplicationCommand;
use serenity::model::channel::{Attachment, Message};
use serenity::model::mention::Mentionable;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::{Invocation, Reply, Source};
use crate::commands::slash::{string_option, user_option};
use crate::core::errors::{classify_platform_error, failure_message, report, Interface, PlatformFailure};
use crate::core::file_utils::DISCORD_UPLOAD_LIMIT;

const COVERUP_TIMEOUT: Duration = Duration::from_secs(30);

const TOO_POWERFUL: &str = "Your attachments are too powerful! I'm not a Nitro user :(";

const UCSD_COPYPASTA: &[&str] = &[
    "Using UC San Diego in place of the UCSD acronym better identifies our campus both",
    "locally and nationally. There’s confusion among San Diego higher education institutions",
    "because of similar acronyms—UCSD, USD, and SDSU—which we eliminate by using UC San Diego.",
    "Additionally, this naming convention is consistent with other campuses in the University of",
    "California system, such as UC Irvine, UC Riverside, UC Santa Barbara, UC Davis, and so on.",
];

/// Text of a covered-up message. Pipes are escaped so they can't close the spoiler early.
pub fn coverup_text(author_mention: &str, content: &str) -> String {
    if content.is_empty() {
        return format!("**Covered up by {author_mention}**");
    }
    format!(
        "**Covered up by {author_mention}**\n||{}||",
        content.replace('|', "\\|")
    )
}

/// Upload name that makes the client blur the attachment
pub fn spoiler_filename(name: &str) -> String {
    if name.starts_with("SPOILER_") {
        name.to_string()
    } else {
        format!("SPOILER_{name}")
    }
}

/// Handler for `coverup`: reposts the invoker's next message behind spoiler tags.
pub struct CoverupHandler {
    descriptor: CommandDescriptor,
}

impl CoverupHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("coverup", prefix)
                .description("Marks the contests of a message with spoiler tags, including attachments. Send the command and reply with another message to spoiler it. The bot will be unable to send videos that a normal user cannot (i.e. large files, etc).")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages]),
        }
    }

    async fn spoiler_files(&self, attachments: &[Attachment]) -> Result<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            if attachment.size > DISCORD_UPLOAD_LIMIT {
                bail!(CoverupError::TooLarge);
            }
            files.push((spoiler_filename(&attachment.filename), attachment.download().await?));
        }
        Ok(files)
    }

    async fn cover_up(&self, invocation: &Invocation<'_>, target: &Message) -> Result<()> {
        let mut reply = Reply::text(coverup_text(
            &invocation.user_id().mention().to_string(),
            &target.content,
        ));
        for (filename, data) in self.spoiler_files(&target.attachments).await? {
            reply = reply.with_file(filename, data);
        }
        invocation.send_to_channel(target.channel_id, reply).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum CoverupError {
    #[error("attachment exceeds the upload limit")]
    TooLarge,
}

fn is_too_large(err: &anyhow::Error) -> bool {
    if err.downcast_ref::<CoverupError>().is_some() {
        return true;
    }
    err.downcast_ref::<serenity::Error>()
        .map(|e| classify_platform_error(e) == PlatformFailure::AttachmentTooLarge)
        .unwrap_or(false)
}

/// The original is removed once it has been reposted, or when it can never be reposted
/// because its attachments are over the limit. Any other failure leaves it in place.
fn should_delete_original(outcome: &Result<()>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(e) => is_too_large(e),
    }
}

#[async_trait]
impl CommandHandler for CoverupHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let serenity = invocation.serenity;
        if let Source::Interaction(_) = invocation.source {
            invocation
                .whisper("Send the message you want covered up in this channel.")
                .await?;
        }
        let mut prompt = invocation
            .channel_id
            .say(&serenity.http, "Waiting on a message to cover up...")
            .await?;

        let Some(target) = invocation
            .channel_id
            .await_reply(serenity)
            .author_id(invocation.user_id())
            .timeout(COVERUP_TIMEOUT)
            .await
        else {
            prompt
                .edit(serenity, |m| m.content("Nothing to cover up, this command expired!"))
                .await?;
            return Ok(());
        };

        if target.content.is_empty() && target.attachments.is_empty() {
            invocation
                .channel_id
                .say(&serenity.http, "I can't cover up an empty message!")
                .await?;
            return Ok(());
        }

        let outcome = self.cover_up(invocation, &target).await;

        // The attachments are gone once the original is deleted, so cleanup waits for the repost.
        if should_delete_original(&outcome) {
            for message in [&*target, &prompt] {
                if let Err(e) = message.delete(serenity).await {
                    warn!("Could not delete message {} after coverup: {e}", message.id);
                }
            }
        }

        match outcome {
            Ok(()) => debug!("Covered up message {}", target.id),
            Err(e) if is_too_large(&e) => {
                warn!("Attachments for cover up call too large: {e}");
                invocation.channel_id.say(&serenity.http, TOO_POWERFUL).await?;
            }
            Err(e) => {
                let error_id = report(Interface::Discord, "Error whilst covering up message", &e);
                invocation
                    .channel_id
                    .say(
                        &serenity.http,
                        failure_message("An error occurred while covering up your message.", error_id),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

/// Handler for `kudos`: a public thank-you note from the invoker.
pub struct KudosHandler {
    descriptor: CommandDescriptor,
}

impl KudosHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("kudos", prefix)
                .description("Sends a thank-you note to someone for you.")
                .usage(prefix, "kudos <user> <message>")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages]),
        }
    }
}

pub fn kudos_text(recipient: &str, sender: &str, note: &str) -> String {
    format!("{recipient}! Kudos to you from {sender} for:\n\n_\"{note}\"_")
}

#[async_trait]
impl CommandHandler for KudosHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        user_option(&mut command, "to", "The user to send a note to.");
        string_option(&mut command, "for", "What the note should say.", true);
        Some(command)
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let (Some(recipient), Some(note)) = (
            invocation.args.user("to", 0),
            invocation.args.rest("for", 1),
        ) else {
            invocation
                .whisper(format!("Usage: `{}`", self.descriptor.usage))
                .await?;
            return Ok(());
        };

        if recipient == invocation.user_id() {
            invocation
                .whisper("Sending a Kudos to yourself? I don't know, that seems counter-intuitive.")
                .await?;
            return Ok(());
        }

        invocation.whisper("Nice! Thanks for being wholesome :3").await?;
        invocation
            .channel_id
            .say(
                &invocation.serenity.http,
                kudos_text(
                    &recipient.mention().to_string(),
                    &invocation.user_id().mention().to_string(),
                    &note,
                ),
            )
            .await?;
        Ok(())
    }
}

/// Handler for `ucsd`
pub struct UcsdHandler {
    descriptor: CommandDescriptor,
}

impl UcsdHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("ucsd", prefix)
                .description("Corrects the spelling of our glorious university, UC San Diego.")
                .category(Category::Meme)
                .aliases(&["ucsandiego"])
                .permissions(&[PermissionTag::SendMessages]),
        }
    }
}

#[async_trait]
impl CommandHandler for UcsdHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        invocation.say(UCSD_COPYPASTA.join(" ")).await?;
        Ok(())
    }
}
