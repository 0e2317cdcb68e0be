//! Command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: One handler per command, descriptor-driven, shared by text and slash input
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use serenity::builder::CreateApplicationCommand;
use std::sync::Arc;

use super::context::CommandContext;
use super::descriptor::CommandDescriptor;
use super::gate::{self, BoardRole, Gate, Invoker};
use super::invocation::Invocation;

/// Trait for command handlers
///
/// Each handler owns one `CommandDescriptor`. Handlers are constructed once at startup,
/// registered with a `CommandRegistry` under their name and aliases, and live for the
/// whole process.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler {
///     descriptor: CommandDescriptor,
/// }
///
/// #[async_trait]
/// impl CommandHandler for PingHandler {
///     fn descriptor(&self) -> &CommandDescriptor {
///         &self.descriptor
///     }
///
///     async fn run(&self, _ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
///         invocation.say("Pong!").await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Metadata used for lookup, gating and help
    fn descriptor(&self) -> &CommandDescriptor;

    /// Slash command schema, if this command is published as one
    fn definition(&self) -> Option<CreateApplicationCommand> {
        None
    }

    /// Permission gate evaluated by the dispatcher before `run`
    fn can_run(&self, invoker: &Invoker, board: &BoardRole) -> Gate {
        gate::check(self.descriptor(), invoker, board)
    }

    /// Execute the command
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared command context (config, HTTP client, portal credentials)
    /// * `invocation` - The caller, arguments and reply channel for this event
    async fn run(&self, ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()>;
}

/// Schema with the descriptor's name and description filled in
pub fn base_definition(descriptor: &CommandDescriptor) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name(descriptor.name)
        .description(crate::core::ellipsize(descriptor.description, 96));
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::descriptor::PermissionTag;

    fn _assert_object_safe(_: &dyn CommandHandler) {}

    struct Fixed(CommandDescriptor);

    #[async_trait]
    impl CommandHandler for Fixed {
        fn descriptor(&self) -> &CommandDescriptor {
            &self.0
        }

        async fn run(&self, _ctx: Arc<CommandContext>, _invocation: &Invocation<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_can_run_uses_gate() {
        let handler = Fixed(
            CommandDescriptor::new("echo", "!")
                .permissions(&[PermissionTag::SendMessages])
                .board_required(),
        );
        let invoker = Invoker::default();
        assert_eq!(handler.can_run(&invoker, &BoardRole::Id(1)), Gate::NotBoard);
        assert!(handler.definition().is_none());
    }

    #[test]
    fn test_base_definition_caps_description() {
        let descriptor = CommandDescriptor::new("checkin", "!").description(
            "Sends a private message with all check-in codes from today's events. Calling with `now` argument sends public embed of checkin code if any events are now live!",
        );
        let definition = base_definition(&descriptor);
        let description = definition.0.get("description").and_then(|v| v.as_str()).unwrap();
        assert!(description.chars().count() <= 100);
        assert_eq!(definition.0.get("name").and_then(|v| v.as_str()), Some("checkin"));
    }
}
