//! Command dispatcher
//!
//! Turns an inbound message or application-command interaction into at most one handler
//! run: resolve the command, evaluate the permission gate, log the invocation and keep
//! handler failures local to the invocation that caused them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use log::{debug, error, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::{Channel, Message};
use serenity::model::id::{GuildId, RoleId};
use serenity::prelude::Context;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::context::CommandContext;
use super::gate::{Gate, Invoker, RoleRef};
use super::handler::CommandHandler;
use super::invocation::{Args, Invocation, Reply, Source};
use super::registry::CommandRegistry;
use crate::core::file_utils::{format_file_size, DISCORD_UPLOAD_LIMIT};
use crate::core::{classify_platform_error, failure_message, report, Interface, PlatformFailure};

/// Reply when someone mentions the bot without a command
pub const MENTION_GREETING: &str = ":pleading_face: :point_right: :point_left:";

/// Reply when the configured maintainer mentions the bot
pub const MAINTAINER_REFUSAL: &str = "I no longer respect your demands, master.";

const GENERIC_FAILURE: &str = "Something went wrong.";

/// Rejection for uploads over the platform limit, quoting the limit in use
pub fn attachment_too_large_message() -> String {
    format!(
        "Your attachments are too large for me to send! Discord bots can only upload up to {}.",
        format_file_size(DISCORD_UPLOAD_LIMIT)
    )
}

/// Where a text message ends up after routing
pub enum TextRoute {
    /// No prefix, unknown or disabled command, and no bot mention
    NotACommand,
    /// The bot was mentioned; reply with this line
    Greeting(&'static str),
    Resolved {
        handler: Arc<dyn CommandHandler>,
        command: String,
        args: Args,
    },
}

/// What happened to a routed invocation
#[derive(Debug)]
pub enum Dispatch {
    Completed,
    /// Disabled commands never reach their body and get no reply
    Unresolved,
    Rejected(Gate),
    Failed(anyhow::Error),
}

/// Run the handler body only when the gate allows it.
pub async fn run_gated<F, Fut>(gate: Gate, run: F) -> Dispatch
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match gate {
        Gate::Allowed => match run().await {
            Ok(()) => Dispatch::Completed,
            Err(err) => Dispatch::Failed(err),
        },
        Gate::Disabled => Dispatch::Unresolved,
        rejected => Dispatch::Rejected(rejected),
    }
}

/// Routes messages and interactions to registered handlers
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    ctx: Arc<CommandContext>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, ctx: Arc<CommandContext>) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Resolve a legacy text message.
    ///
    /// The first whitespace-delimited token after the prefix is the command name
    /// (case-insensitive). A bot mention that is not a command gets a greeting.
    pub fn route_text(&self, content: &str, author_id: u64, mentions_bot: bool) -> TextRoute {
        if let Some(body) = content.strip_prefix(self.ctx.prefix()) {
            let body = body.trim_start();
            let (word, rest) = body
                .split_once(char::is_whitespace)
                .unwrap_or((body, ""));
            let command = word.to_lowercase();

            if !command.is_empty() {
                if let Some(handler) = self.registry.get(&command) {
                    if handler.descriptor().enabled {
                        return TextRoute::Resolved {
                            handler,
                            command,
                            args: Args::from_text(rest),
                        };
                    }
                }
            }
        }

        if mentions_bot {
            if self.ctx.config.maintainer_id == Some(author_id) {
                return TextRoute::Greeting(MAINTAINER_REFUSAL);
            }
            return TextRoute::Greeting(MENTION_GREETING);
        }

        TextRoute::NotACommand
    }

    /// Resolve an interaction by its exact command name.
    pub fn route_interaction(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.registry
            .get(name)
            .filter(|handler| handler.descriptor().enabled)
    }

    /// Entry point for message-create events
    pub async fn handle_message(&self, serenity: &Context, msg: &Message) -> Result<()> {
        if msg.author.bot {
            return Ok(());
        }

        let mentions_bot = msg.mentions_user_id(serenity.cache.current_user_id());
        match self.route_text(&msg.content, msg.author.id.0, mentions_bot) {
            TextRoute::NotACommand => Ok(()),
            TextRoute::Greeting(line) => {
                debug!("Mentioned by {} in channel {}", msg.author.id, msg.channel_id);
                msg.channel_id.say(&serenity.http, line).await?;
                Ok(())
            }
            TextRoute::Resolved {
                handler,
                command,
                args,
            } => {
                let invoker = invoker_from_message(serenity, msg).await;
                let invocation =
                    Invocation::new(serenity, Source::Message(msg), command, invoker, args);
                self.execute(handler, invocation).await
            }
        }
    }

    /// Entry point for application-command interactions
    pub async fn handle_interaction(
        &self,
        serenity: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let name = command.data.name.as_str();
        let Some(handler) = self.route_interaction(name) else {
            warn!("Interaction for unknown or disabled command '{name}' from {}", command.user.id);
            let invocation = Invocation::new(
                serenity,
                Source::Interaction(command),
                name.to_string(),
                invoker_from_interaction(serenity, command),
                Args::Options(Vec::new()),
            );
            invocation.whisper("That command is not available.").await?;
            return Ok(());
        };

        let invoker = invoker_from_interaction(serenity, command);
        let invocation = Invocation::new(
            serenity,
            Source::Interaction(command),
            name.to_string(),
            invoker,
            Args::Options(command.data.options.clone()),
        );
        self.execute(handler, invocation).await
    }

    async fn execute(
        &self,
        handler: Arc<dyn CommandHandler>,
        invocation: Invocation<'_>,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let audit = format!(
            "Command: {} | User: {} ({}) | Guild: {} | Channel: {} | Args: '{}'",
            invocation.command,
            invocation.invoker.display_name,
            invocation.invoker.user_id,
            invocation
                .guild_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "DM".to_string()),
            invocation.channel_id,
            invocation.args.raw()
        );

        let outcome = self
            .admit(request_id, handler.as_ref(), &invocation.invoker, &audit, |ctx| {
                handler.run(ctx, &invocation)
            })
            .await;

        match outcome {
            Dispatch::Completed => {
                debug!("[{request_id}] ✅ {} completed", invocation.command);
            }
            Dispatch::Unresolved => {
                debug!("[{request_id}] {} is disabled", invocation.command);
            }
            Dispatch::Rejected(gate) => {
                warn!(
                    "[{request_id}] 🚫 {} rejected for {} ({:?})",
                    invocation.command, invocation.invoker.user_id, gate
                );
                if let Some(message) = gate.rejection_message() {
                    invocation.reply(Reply::text(message).ephemeral()).await?;
                }
            }
            Dispatch::Failed(err) => self.report_failure(&invocation, &err).await,
        }
        Ok(())
    }

    /// Evaluate the gate for `invoker` and run the body only if it passes.
    ///
    /// Admitted runs are logged with `audit` before the body starts.
    pub async fn admit<F, Fut>(
        &self,
        request_id: Uuid,
        handler: &dyn CommandHandler,
        invoker: &Invoker,
        audit: &str,
        run: F,
    ) -> Dispatch
    where
        F: FnOnce(Arc<CommandContext>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let gate = handler.can_run(invoker, &self.ctx.board);
        if gate == Gate::Allowed {
            info!("[{request_id}] 🎯 {audit}");
        }
        let ctx = Arc::clone(&self.ctx);
        run_gated(gate, move || run(ctx)).await
    }

    /// Log the failure under a correlation id and tell the invoker about it.
    async fn report_failure(&self, invocation: &Invocation<'_>, err: &anyhow::Error) {
        let platform = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<serenity::Error>())
            .map(classify_platform_error);

        let (interface, lead) = match platform {
            Some(PlatformFailure::AttachmentTooLarge) => {
                (Interface::Discord, attachment_too_large_message())
            }
            Some(PlatformFailure::Other) => (Interface::Discord, GENERIC_FAILURE.to_string()),
            None => (Interface::Command, GENERIC_FAILURE.to_string()),
        };

        let error_id = report(
            interface,
            &format!("{} failed for {}", invocation.command, invocation.invoker.user_id),
            err,
        );

        let reply = Reply::text(failure_message(&lead, error_id)).ephemeral();
        if let Err(send_err) = invocation.reply(reply).await {
            error!("[{error_id}] ❌ Could not deliver failure notice: {send_err:#}");
        }
    }
}

fn resolve_roles(serenity: &Context, guild_id: GuildId, role_ids: &[RoleId]) -> Vec<RoleRef> {
    role_ids
        .iter()
        .map(|role_id| RoleRef {
            id: role_id.0,
            name: serenity.cache.role(guild_id, *role_id).map(|role| role.name),
        })
        .collect()
}

/// Build the gate's view of a message author.
///
/// Members missing from the cache are fetched over HTTP so their permissions can be
/// computed. When they still cannot be resolved, `permissions` stays `None` and the gate
/// treats the author as holding none.
pub async fn invoker_from_message(serenity: &Context, msg: &Message) -> Invoker {
    let mut invoker = Invoker {
        user_id: msg.author.id.0,
        display_name: msg.author.tag(),
        ..Invoker::default()
    };

    let Some(guild_id) = msg.guild_id else {
        return invoker;
    };

    invoker.in_guild = true;
    let role_ids = msg
        .member
        .as_ref()
        .map(|member| member.roles.clone())
        .unwrap_or_default();
    invoker.roles = resolve_roles(serenity, guild_id, &role_ids);

    let Some(guild) = serenity.cache.guild(guild_id) else {
        warn!("Guild {guild_id} not cached, permissions for {} unresolved", msg.author.id);
        return invoker;
    };
    invoker.is_owner = guild.owner_id == msg.author.id;

    let member = match guild.members.get(&msg.author.id) {
        Some(member) => Some(member.clone()),
        None => match guild_id.member(serenity, msg.author.id).await {
            Ok(member) => Some(member),
            Err(e) => {
                warn!("Could not fetch member {} in {guild_id}: {e}", msg.author.id);
                None
            }
        },
    };

    invoker.permissions = member.map(|member| match guild.channels.get(&msg.channel_id) {
        Some(Channel::Guild(channel)) => guild
            .user_permissions_in(channel, &member)
            .unwrap_or_else(|_| guild.member_permissions(&member)),
        // Threads and uncached channels fall back to guild-wide permissions
        _ => guild.member_permissions(&member),
    });

    invoker
}

/// Build the gate's view of an interaction user. Interactions carry resolved permissions.
pub fn invoker_from_interaction(
    serenity: &Context,
    command: &ApplicationCommandInteraction,
) -> Invoker {
    let user = command
        .member
        .as_ref()
        .map(|member| &member.user)
        .unwrap_or(&command.user);

    let mut invoker = Invoker {
        user_id: user.id.0,
        display_name: user.tag(),
        ..Invoker::default()
    };

    let (Some(guild_id), Some(member)) = (command.guild_id, command.member.as_ref()) else {
        return invoker;
    };

    invoker.in_guild = true;
    invoker.roles = resolve_roles(serenity, guild_id, &member.roles);
    invoker.permissions = member.permissions;
    invoker.is_owner = serenity
        .cache
        .guild_field(guild_id, |guild| guild.owner_id)
        .map(|owner| owner == user.id)
        .unwrap_or(false);

    invoker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::test_context;
    use crate::commands::descriptor::{CommandDescriptor, PermissionTag};
    use crate::commands::gate::member;
    use crate::core::DuplicatePolicy;
    use async_trait::async_trait;
    use serenity::model::permissions::Permissions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often its body runs
    struct SpyHandler {
        descriptor: CommandDescriptor,
        runs: AtomicUsize,
    }

    impl SpyHandler {
        fn new(descriptor: CommandDescriptor) -> Arc<Self> {
            Arc::new(Self {
                descriptor,
                runs: AtomicUsize::new(0),
            })
        }

        /// Everything `run` does; it never touches the invocation
        async fn body(&self, _ctx: Arc<CommandContext>) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl CommandHandler for SpyHandler {
        fn descriptor(&self) -> &CommandDescriptor {
            &self.descriptor
        }

        async fn run(&self, ctx: Arc<CommandContext>, _invocation: &Invocation<'_>) -> Result<()> {
            self.body(ctx).await
        }
    }

    fn dispatcher(handlers: Vec<Arc<dyn CommandHandler>>) -> Dispatcher {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        for handler in handlers {
            registry.register(handler).unwrap();
        }
        Dispatcher::new(Arc::new(registry), test_context())
    }

    /// Route `content` like a message from `invoker`, then gate and run it.
    async fn send(d: &Dispatcher, spy: &SpyHandler, content: &str, invoker: &Invoker) -> Dispatch {
        let TextRoute::Resolved { handler, command, .. } = d.route_text(content, invoker.user_id, false)
        else {
            panic!("{content} did not resolve");
        };
        d.admit(Uuid::new_v4(), handler.as_ref(), invoker, &command, |ctx| spy.body(ctx))
            .await
    }

    fn board_echo() -> Arc<SpyHandler> {
        SpyHandler::new(
            CommandDescriptor::new("echo", "!")
                .permissions(&[PermissionTag::SendMessages])
                .board_required(),
        )
    }

    #[tokio::test]
    async fn test_board_command_body_never_runs_for_non_board_member() {
        let spy = board_echo();
        let d = dispatcher(vec![spy.clone() as Arc<dyn CommandHandler>]);
        let invoker = member(&[(5, "Member")], Permissions::all());

        let outcome = send(&d, &spy, "!echo hello", &invoker).await;

        assert!(matches!(outcome, Dispatch::Rejected(Gate::NotBoard)));
        assert_eq!(spy.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_board_member_runs_body_once() {
        // test_config leaves BOARD_ROLE_ID unset, so the role named "Board" counts
        let spy = board_echo();
        let d = dispatcher(vec![spy.clone() as Arc<dyn CommandHandler>]);
        let invoker = member(&[(9, "Board")], Permissions::SEND_MESSAGES);

        let outcome = send(&d, &spy, "!echo hello", &invoker).await;

        assert!(matches!(outcome, Dispatch::Completed));
        assert_eq!(spy.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncached_member_cannot_run_permissioned_command() {
        let spy = SpyHandler::new(
            CommandDescriptor::new("cat", "!")
                .permissions(&[PermissionTag::AttachFiles, PermissionTag::EmbedLinks]),
        );
        let d = dispatcher(vec![spy.clone() as Arc<dyn CommandHandler>]);
        let invoker = Invoker {
            user_id: 7,
            in_guild: true,
            permissions: None,
            ..Invoker::default()
        };

        let outcome = send(&d, &spy, "!cat", &invoker).await;

        assert!(matches!(outcome, Dispatch::Rejected(Gate::MissingPermissions(_))));
        assert_eq!(spy.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_command_is_unresolved_without_running() {
        let spy = SpyHandler::new(CommandDescriptor::new("ping", "!").disabled());
        let d = dispatcher(vec![spy.clone() as Arc<dyn CommandHandler>]);

        let outcome = d
            .admit(
                Uuid::new_v4(),
                spy.as_ref(),
                &member(&[], Permissions::all()),
                "ping",
                |ctx| spy.body(ctx),
            )
            .await;

        assert!(matches!(outcome, Dispatch::Unresolved));
        assert_eq!(spy.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_attachment_limit_message_uses_upload_limit() {
        let message = attachment_too_large_message();
        assert!(message.ends_with("up to 25.0 MB."), "{message}");
    }

    #[tokio::test]
    async fn test_handler_failure_is_contained() {
        let outcome = run_gated(Gate::Allowed, || async { Err(anyhow::anyhow!("cat api down")) }).await;
        match outcome {
            Dispatch::Failed(err) => assert_eq!(err.to_string(), "cat api down"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_route_text_resolves_prefix_and_args() {
        let d = dispatcher(vec![SpyHandler::new(CommandDescriptor::new("qr", "!"))]);
        match d.route_text("!QR https://acmucsd.com  Our site", 7, false) {
            TextRoute::Resolved { command, args, .. } => {
                assert_eq!(command, "qr");
                assert_eq!(args.string("content", 0).as_deref(), Some("https://acmucsd.com"));
                assert_eq!(args.rest("title", 1).as_deref(), Some("Our site"));
            }
            _ => panic!("expected a resolved command"),
        }
    }

    #[test]
    fn test_route_text_resolves_alias() {
        let d = dispatcher(vec![SpyHandler::new(
            CommandDescriptor::new("ucsd", "!").aliases(&["ucsandiego"]),
        )]);
        assert!(matches!(
            d.route_text("!ucsandiego", 7, false),
            TextRoute::Resolved { .. }
        ));
    }

    #[test]
    fn test_route_text_ignores_unprefixed_and_unknown() {
        let d = dispatcher(vec![SpyHandler::new(CommandDescriptor::new("cat", "!"))]);
        assert!(matches!(d.route_text("cat", 7, false), TextRoute::NotACommand));
        assert!(matches!(d.route_text("!dog", 7, false), TextRoute::NotACommand));
        assert!(matches!(d.route_text("!", 7, false), TextRoute::NotACommand));
    }

    #[test]
    fn test_route_text_treats_disabled_as_unknown() {
        let d = dispatcher(vec![SpyHandler::new(CommandDescriptor::new("ping", "!").disabled())]);
        assert!(matches!(d.route_text("!ping", 7, false), TextRoute::NotACommand));
        assert!(d.route_interaction("ping").is_none());
    }

    #[test]
    fn test_mention_greeting_and_maintainer_refusal() {
        let d = dispatcher(Vec::new());
        assert!(matches!(
            d.route_text("<@1000> hi", 7, true),
            TextRoute::Greeting(MENTION_GREETING)
        ));
        // test_config sets the maintainer to 42
        assert!(matches!(
            d.route_text("<@1000>", 42, true),
            TextRoute::Greeting(MAINTAINER_REFUSAL)
        ));
    }

    #[test]
    fn test_command_wins_over_mention() {
        let d = dispatcher(vec![SpyHandler::new(CommandDescriptor::new("help", "!"))]);
        assert!(matches!(
            d.route_text("!help <@1000>", 7, true),
            TextRoute::Resolved { .. }
        ));
    }
}
