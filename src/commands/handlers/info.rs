//! Information command handlers
//!
//! Handles: help, top, isleaguetime
//!
//! - **Version**: 2.1.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.1.0: Yearly and quarterly leaderboards
//! - 2.0.0: Help listing built from the registry, portal leaderboard, league time
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serenity::builder::{CreateApplicationCommand, CreateEmbed};
use serenity::model::application::interaction::InteractionResponseType;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::commands::components::{pagination_buttons, PageAction};
use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::{Args, Invocation, Reply};
use crate::commands::slash::{choice_option, integer_option, string_option};
use crate::core::embeds::{info_embed, INFO_COLOR};
use crate::core::errors::{failure_message, report, Interface};
use crate::core::valid_number;
use crate::features::league_time::is_league_time;
use crate::features::portal::{AcademicCalendar, CalendarError, LeaderboardKind, PortalUser};

pub const LEADERBOARD_DEFAULT: i64 = 10;
pub const LEADERBOARD_MIN: i64 = 3;
pub const LEADERBOARD_MAX: i64 = 100;
pub const LEADERBOARD_PAGE_SIZE: usize = 10;

/// How long the leaderboard buttons keep responding
const PAGINATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Handler for `help`.
///
/// Built after every other command is registered, from a snapshot of their descriptors.
pub struct HelpHandler {
    descriptor: CommandDescriptor,
    listing: String,
    entries: HashMap<&'static str, CommandDescriptor>,
}

impl HelpHandler {
    pub fn new(prefix: &str, commands: &[CommandDescriptor]) -> Self {
        let descriptor = CommandDescriptor::new("help", prefix)
            .description("Displays the documentation for a provided command. If no arguments received, all commands are shown with a brief description.")
            .usage(prefix, "help [command]")
            .category(Category::Information)
            .permissions(&[PermissionTag::SendMessages]);

        let mut lines = vec![format!("All commands are prefixed with `{prefix}`.\n")];
        let mut entries = HashMap::new();
        for command in commands.iter().chain(std::iter::once(&descriptor)) {
            if !command.enabled {
                continue;
            }
            lines.push(format!("`{}`: {}", command.name, command.description));
            entries.insert(command.name, command.clone());
            for alias in command.aliases {
                entries.insert(*alias, command.clone());
            }
        }

        Self {
            descriptor,
            listing: lines.join("\n"),
            entries,
        }
    }

    /// Embed for the full listing, or for one command by name or alias
    pub fn help_embed(&self, command: Option<&str>) -> Option<CreateEmbed> {
        match command {
            None => Some(info_embed(":question: Available Commands", &self.listing)),
            Some(name) => {
                let entry = self.entries.get(name.to_lowercase().as_str())?;
                let mut description =
                    format!("Usage: `{}` \n\n {}", entry.usage, entry.description);
                if !entry.aliases.is_empty() {
                    description.push_str(&format!("\n\nAliases: `{}`", entry.aliases.join("`, `")));
                }
                Some(info_embed(&format!(":question: Help for `{name}`"), &description))
            }
        }
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        string_option(&mut command, "command", "The command to get help for.", false);
        Some(command)
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let requested = invocation.args.string("command", 0);
        match self.help_embed(requested.as_deref()) {
            Some(embed) => invocation.reply(Reply::embed(embed)).await?,
            None => invocation.say("Command not found!").await?,
        };
        Ok(())
    }
}

/// Handler for `isleaguetime`
pub struct IsLeagueTimeHandler {
    descriptor: CommandDescriptor,
}

impl IsLeagueTimeHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("isleaguetime", prefix)
                .description("Checks whether League Time is currently active. League Time is defined as 10 PM - 6 AM.")
                .category(Category::Information)
                .permissions(&[PermissionTag::SendMessages]),
        }
    }
}

#[async_trait]
impl CommandHandler for IsLeagueTimeHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let answer = if is_league_time(Utc::now()) { "True." } else { "False." };
        invocation.say(answer).await?;
        Ok(())
    }
}

/// Handler for `top`: the portal leaderboard for all time, the current academic year or
/// the current quarter, ten members per page.
pub struct TopHandler {
    descriptor: CommandDescriptor,
}

impl TopHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("top", prefix)
                .description("Shows the top `number` members on the Membership Portal leaderboard. By default, show the top 10 on the all-time leaderboard. Optionally, you can filter by current quarter or academic year.")
                .usage(prefix, "top [number: min 3, max 100] [type: Yearly | Quarterly | All-Time]")
                .category(Category::Information)
                .permissions(&[PermissionTag::SendMessages, PermissionTag::EmbedLinks]),
        }
    }
}

/// Leaderboard line for the member at 1-based `position`
fn leaderboard_line(position: usize, user: &PortalUser) -> String {
    let rank = match position {
        1 => ":first_place:".to_string(),
        2 => ":second_place:".to_string(),
        3 => ":third_place:".to_string(),
        n => format!("{n}."),
    };
    format!(
        "{rank} **[{}]({})**, {} points",
        user.full_name(),
        user.profile_url(),
        user.points
    )
}

/// Split the leaderboard into page descriptions
pub fn leaderboard_pages(users: &[PortalUser]) -> Vec<String> {
    users
        .chunks(LEADERBOARD_PAGE_SIZE)
        .enumerate()
        .map(|(page, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(i, user)| leaderboard_line(page * LEADERBOARD_PAGE_SIZE + i + 1, user))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// Leaderboard type from the `type` option, or from the text argument after the size
/// (or in its place). `None` means the argument names no leaderboard.
fn requested_kind(args: &Args) -> Option<LeaderboardKind> {
    if let Some(given) = args.string("type", 1) {
        return LeaderboardKind::parse(&given);
    }
    match args.string("type", 0) {
        Some(given) if !valid_number(&given) => LeaderboardKind::parse(&given),
        _ => Some(LeaderboardKind::default()),
    }
}

fn not_in_session_message(kind: LeaderboardKind) -> String {
    let period = match kind {
        LeaderboardKind::Quarterly => "quarter",
        _ => "year",
    };
    format!("There's no academic {period} in session right now! Try the All-Time leaderboard instead.")
}

fn leaderboard_embed(page: &str, kind: LeaderboardKind) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title(format!(":bar_chart: {kind} Leaderboard"))
        .description(page)
        .footer(|f| f.text("Data: Membership Portal"))
        .color(INFO_COLOR);
    embed
}

#[async_trait]
impl CommandHandler for TopHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        integer_option(
            &mut command,
            "members",
            "Number of members to list.",
            LEADERBOARD_MIN,
            LEADERBOARD_MAX,
        );
        let kinds: Vec<&str> = LeaderboardKind::ALL.iter().map(|kind| kind.label()).collect();
        choice_option(
            &mut command,
            "type",
            "Type of leaderboard (All-Time, Quarterly, Yearly)",
            &kinds,
        );
        Some(command)
    }

    async fn run(&self, ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let size = invocation
            .args
            .integer("members", 0)
            .unwrap_or(LEADERBOARD_DEFAULT);
        if !(LEADERBOARD_MIN..=LEADERBOARD_MAX).contains(&size) {
            invocation
                .say("Leaderboard size should be between 3 and 100!")
                .await?;
            return Ok(());
        }

        let Some(kind) = requested_kind(&invocation.args) else {
            invocation
                .say("Leaderboard type should be Yearly, Quarterly or All-Time!")
                .await?;
            return Ok(());
        };

        invocation.defer(false).await?;
        let bounds = match AcademicCalendar::bundled()
            .and_then(|calendar| calendar.bounds_for(kind, Utc::now()))
        {
            Ok(bounds) => bounds,
            Err(CalendarError::NotInSession { .. }) => {
                invocation.edit(Reply::text(not_in_session_message(kind))).await?;
                return Ok(());
            }
            Err(e) => {
                let error_id = report(
                    Interface::Command,
                    "Error whilst reading the academic calendar",
                    &anyhow::Error::new(e),
                );
                invocation
                    .edit(Reply::text(failure_message(
                        "I couldn't work out the current academic term.",
                        error_id,
                    )))
                    .await?;
                return Ok(());
            }
        };
        debug!("{kind} leaderboard of {size} with bounds {bounds:?}");

        let users = match ctx.portal.leaderboard(size as u32, bounds).await {
            Ok(users) => users,
            Err(e) => {
                let error_id = report(
                    Interface::PortalApi,
                    "Error whilst extracting leaderboard information",
                    &anyhow::Error::new(e),
                );
                invocation
                    .edit(Reply::text(failure_message(
                        "An error occurred when attempting to query the leaderboard data from the portal API.",
                        error_id,
                    )))
                    .await?;
                return Ok(());
            }
        };

        let pages = leaderboard_pages(&users);
        if pages.is_empty() {
            invocation.edit(Reply::text("The leaderboard is empty!")).await?;
            return Ok(());
        }
        if pages.len() == 1 {
            invocation.edit(Reply::embed(leaderboard_embed(&pages[0], kind))).await?;
            return Ok(());
        }

        let action_id = Uuid::new_v4().simple().to_string();
        let first = Reply::embed(leaderboard_embed(&pages[0], kind))
            .with_components(pagination_buttons(&action_id, 0, pages.len(), false));
        let Some(mut message) = invocation.edit(first).await? else {
            return Ok(());
        };

        let serenity = invocation.serenity;
        let mut current = 0;
        while let Some(press) = message
            .await_component_interaction(serenity)
            .author_id(invocation.user_id())
            .timeout(PAGINATION_TIMEOUT)
            .await
        {
            let Some(action) = PageAction::parse(&press.data.custom_id, &action_id) else {
                continue;
            };
            current = action.apply(current, pages.len());
            debug!("Leaderboard page {current} for {}", invocation.user_id());
            press
                .create_interaction_response(&serenity.http, |response| {
                    response
                        .kind(InteractionResponseType::UpdateMessage)
                        .interaction_response_data(|data| {
                            data.set_embed(leaderboard_embed(&pages[current], kind))
                                .set_components(pagination_buttons(&action_id, current, pages.len(), false))
                        })
                })
                .await?;
        }

        message
            .edit(serenity, |m| {
                m.set_embed(leaderboard_embed(&pages[current], kind))
                    .set_components(pagination_buttons(&action_id, current, pages.len(), true))
            })
            .await?;
        Ok(())
    }
}
