//! # Slash Commands (/)
//!
//! Application-command schemas built from the registered handlers, and per-guild
//! registration.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Schemas come from `CommandHandler::definition`; guild registration only
//! - 2.0.0: Consolidate plugins into single /plugins command with subcommands
//! - 1.0.0: Reorganized from monolithic slash_commands.rs

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use super::registry::CommandRegistry;

/// Schemas for every enabled handler that publishes one, in registration order
pub fn create_slash_commands(registry: &CommandRegistry) -> Vec<CreateApplicationCommand> {
    registry
        .handlers()
        .iter()
        .filter(|handler| handler.descriptor().enabled)
        .filter_map(|handler| handler.definition())
        .collect()
}

/// Replace the guild's application commands with the registry's schemas.
pub async fn register_guild_commands(
    ctx: &Context,
    guild_id: GuildId,
    registry: &CommandRegistry,
) -> Result<usize> {
    let slash_commands = create_slash_commands(registry);
    let count = slash_commands.len();

    guild_id
        .set_application_commands(&ctx.http, |commands| {
            for command in slash_commands {
                commands.add_application_command(command);
            }
            commands
        })
        .await?;

    info!("Guild slash commands registered for guild {guild_id} ({count} commands)");
    Ok(count)
}

/// Add a string option
pub fn string_option(
    command: &mut CreateApplicationCommand,
    name: &str,
    description: &str,
    required: bool,
) {
    command.create_option(|option| {
        option
            .name(name)
            .description(description)
            .kind(CommandOptionType::String)
            .required(required)
    });
}

/// Add an optional string option limited to `choices`
pub fn choice_option(
    command: &mut CreateApplicationCommand,
    name: &str,
    description: &str,
    choices: &[&str],
) {
    command.create_option(|option| {
        option
            .name(name)
            .description(description)
            .kind(CommandOptionType::String)
            .required(false);
        for choice in choices {
            option.add_string_choice(choice, choice);
        }
        option
    });
}

/// Add a boolean option
pub fn bool_option(command: &mut CreateApplicationCommand, name: &str, description: &str) {
    command.create_option(|option| {
        option
            .name(name)
            .description(description)
            .kind(CommandOptionType::Boolean)
            .required(false)
    });
}

/// Add an optional integer option bounded to `[min, max]`
pub fn integer_option(
    command: &mut CreateApplicationCommand,
    name: &str,
    description: &str,
    min: i64,
    max: i64,
) {
    command.create_option(|option| {
        option
            .name(name)
            .description(description)
            .kind(CommandOptionType::Integer)
            .min_int_value(min)
            .max_int_value(max)
            .required(false)
    });
}

/// Add a required user option
pub fn user_option(command: &mut CreateApplicationCommand, name: &str, description: &str) {
    command.create_option(|option| {
        option
            .name(name)
            .description(description)
            .kind(CommandOptionType::User)
            .required(true)
    });
}
