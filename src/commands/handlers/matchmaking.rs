//! Member matching handler
//!
//! Handles: match
//!
//! Pairs everyone holding the match role and opens a private thread per group.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use serenity::builder::{CreateApplicationCommand, CreateComponents};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::ChannelType;
use serenity::model::guild::Member;
use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::mention::Mentionable;
use serenity::prelude::Context;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::commands::components::{confirmation_buttons, confirmation_choice};
use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::{Invocation, Reply};
use crate::core::ellipsize;
use crate::features::matchmaking::{
    make_groups, role_holders, LastRun, MatchError, MEMBER_PAGE_SIZE, THREAD_CREATION_DELAY,
};

const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Threads archive after a week without messages
const THREAD_ARCHIVE_MINUTES: u16 = 10080;

const THREAD_NAME_LIMIT: usize = 100;

pub struct MatchHandler {
    descriptor: CommandDescriptor,
    role_id: Option<u64>,
    last_run: LastRun,
}

impl MatchHandler {
    pub fn new(prefix: &str, role_id: Option<u64>) -> Self {
        Self {
            descriptor: CommandDescriptor::new("match", prefix)
                .description("Matches all members with the Donuts role into groups of 2 or 3.")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages]),
            role_id,
            last_run: LastRun::default(),
        }
    }

    async fn prompt_text(&self) -> String {
        match self.last_run.get().await {
            Some(at) => format!(
                "Are you sure you want to run this command?\nMatches were last generated <t:{}:f>.",
                at.timestamp()
            ),
            None => "Are you sure you want to run this command?".to_string(),
        }
    }

    /// Every holder of the match role, read from the member list one page at a time
    async fn role_members(&self, serenity: &Context, guild_id: GuildId, role: RoleId) -> Result<Vec<Member>> {
        let http = &serenity.http;
        let members = role_holders(role.0, MEMBER_PAGE_SIZE, move |after, limit| async move {
            guild_id
                .members(http, Some(limit), after.map(UserId))
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;
        debug!("Found {} holders of role {role} in guild {guild_id}", members.len());
        Ok(members)
    }

    async fn create_matches(&self, invocation: &Invocation<'_>, guild_id: GuildId, role: RoleId) -> Result<usize> {
        let serenity = invocation.serenity;
        let members = self.role_members(serenity, guild_id, role).await?;
        let groups = make_groups(members, &mut rand::rng())?;

        for group in &groups {
            let names: Vec<String> = group.iter().map(|m| m.display_name().to_string()).collect();
            let mentions: Vec<String> = group.iter().map(|m| m.user.id.mention().to_string()).collect();

            let thread = invocation
                .channel_id
                .create_private_thread(&serenity.http, |thread| {
                    thread
                        .name(thread_name(&names))
                        .auto_archive_duration(THREAD_ARCHIVE_MINUTES)
                        .kind(ChannelType::PrivateThread)
                })
                .await?;

            for member in group {
                if let Err(e) = thread.id.add_thread_member(&serenity.http, member.user.id).await {
                    warn!("Could not add {} to thread {}: {e}", member.user.id, thread.id);
                }
            }
            thread.id.say(&serenity.http, hello_message(&mentions)).await?;

            tokio::time::sleep(THREAD_CREATION_DELAY).await;
        }

        Ok(groups.len())
    }
}

/// `Donuts - a, b`, cut to the platform's thread name limit
pub fn thread_name(display_names: &[String]) -> String {
    ellipsize(&format!("Donuts - {}", display_names.join(", ")), THREAD_NAME_LIMIT - 3)
}

pub fn hello_message(mentions: &[String]) -> String {
    format!(
        "# :wave: Hello {} – time to meet up for donuts!\n## I'm here to help you get to know your teammates by pairing everyone up every week.\n## Why don't you all pick a time to meet and hang out?",
        mentions.join(", ")
    )
}

#[async_trait]
impl CommandHandler for MatchHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        invocation.defer(true).await?;

        if !invocation.invoker.is_administrator() {
            invocation
                .edit(Reply::text("You need to be an administrator to run this command!").ephemeral())
                .await?;
            return Ok(());
        }
        let (Some(guild_id), Some(role_id)) = (invocation.guild_id, self.role_id) else {
            invocation
                .edit(Reply::text("Matching isn't set up for this server.").ephemeral())
                .await?;
            return Ok(());
        };

        let action_id = Uuid::new_v4().simple().to_string();
        let prompt = Reply::text(self.prompt_text().await)
            .with_components(confirmation_buttons(&action_id, false))
            .ephemeral();
        let Some(message) = invocation.edit(prompt).await? else {
            return Ok(());
        };

        let serenity = invocation.serenity;
        let press = message
            .await_component_interaction(serenity)
            .author_id(invocation.user_id())
            .filter({
                let action_id = action_id.clone();
                move |press| confirmation_choice(&press.data.custom_id, &action_id).is_some()
            })
            .timeout(CONFIRMATION_TIMEOUT)
            .await;

        let Some(press) = press else {
            invocation
                .edit(Reply::text("This command expired!").with_components(CreateComponents::default()))
                .await?;
            return Ok(());
        };

        let confirmed = confirmation_choice(&press.data.custom_id, &action_id).unwrap_or(false);
        let status = if confirmed { "Matching members!" } else { "Matching cancelled." };
        press
            .create_interaction_response(&serenity.http, |response| {
                response
                    .kind(InteractionResponseType::UpdateMessage)
                    .interaction_response_data(|data| {
                        data.content(status)
                            .set_components(confirmation_buttons(&action_id, true))
                    })
            })
            .await?;
        if !confirmed {
            return Ok(());
        }

        let outcome = match self.create_matches(invocation, guild_id, RoleId(role_id)).await {
            Ok(groups) => {
                self.last_run.record(Utc::now()).await;
                info!(
                    "[{action_id}] Matched members into {groups} group(s) in guild {guild_id}"
                );
                "Members successfully matched!".to_string()
            }
            Err(e) => match e.downcast_ref::<MatchError>() {
                Some(MatchError::TooFewMembers(n)) => {
                    format!("Need at least 2 members with the role to match, found {n}.")
                }
                None => return Err(e),
            },
        };

        press
            .edit_original_interaction_response(&serenity.http, |response| {
                response.content(outcome).components(|c| c)
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_name_lists_display_names() {
        let names = vec!["Ada".to_string(), "Grace".to_string()];
        assert_eq!(thread_name(&names), "Donuts - Ada, Grace");
    }

    #[test]
    fn test_thread_name_fits_limit() {
        let names: Vec<String> = (0..3).map(|i| format!("{}{i}", "x".repeat(60))).collect();
        assert!(thread_name(&names).chars().count() <= THREAD_NAME_LIMIT);
    }

    #[test]
    fn test_hello_mentions_everyone() {
        let text = hello_message(&["<@1>".to_string(), "<@2>".to_string()]);
        assert!(text.starts_with("# :wave: Hello <@1>, <@2> – time to meet up for donuts!"));
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_prompt_mentions_last_run() {
        let handler = MatchHandler::new("!", Some(1));
        assert_eq!(handler.prompt_text().await, "Are you sure you want to run this command?");

        let at = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 1, 8, 17, 0, 0).unwrap();
        handler.last_run.record(at).await;
        assert!(handler
            .prompt_text()
            .await
            .ends_with(&format!("<t:{}:f>.", at.timestamp())));
    }
}
