//! Per-event invocation context
//!
//! One `Invocation` is built for every accepted command and dropped when the handler
//! returns. It hides whether the command arrived as a prefixed message or as an
//! application-command interaction.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use regex::Regex;
use serenity::builder::{CreateComponents, CreateEmbed};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::{AttachmentType, Message};
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::Context;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use super::gate::Invoker;

static USER_MENTION: OnceLock<Regex> = OnceLock::new();

/// Parse `<@123>`, `<@!123>` or a bare id into a user id.
pub fn parse_user_mention(token: &str) -> Option<UserId> {
    let re = USER_MENTION.get_or_init(|| Regex::new(r"^<@!?(\d+)>$|^(\d+)$").expect("valid regex"));
    let caps = re.captures(token.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(UserId)
}

/// Command arguments in either input shape
#[derive(Debug, Clone)]
pub enum Args {
    /// Whitespace-split tokens after the command name
    Text(Vec<String>),
    /// Structured options bag from an interaction
    Options(Vec<CommandDataOption>),
}

impl Args {
    /// Tokenize the text after the command word.
    pub fn from_text(rest: &str) -> Self {
        Args::Text(rest.split_whitespace().map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Args::Text(tokens) => tokens.is_empty(),
            Args::Options(options) => options.is_empty(),
        }
    }

    fn option(&self, name: &str) -> Option<&serde_json::Value> {
        match self {
            Args::Options(options) => options
                .iter()
                .find(|opt| opt.name == name)
                .and_then(|opt| opt.value.as_ref()),
            Args::Text(_) => None,
        }
    }

    /// Single token at `position`, or the named string option
    pub fn string(&self, name: &str, position: usize) -> Option<String> {
        match self {
            Args::Text(tokens) => tokens.get(position).cloned(),
            Args::Options(_) => self.option(name).and_then(|v| v.as_str()).map(str::to_string),
        }
    }

    /// All tokens from `position` joined by spaces, or the named string option
    pub fn rest(&self, name: &str, position: usize) -> Option<String> {
        match self {
            Args::Text(tokens) if tokens.len() > position => Some(tokens[position..].join(" ")),
            Args::Text(_) => None,
            Args::Options(_) => self.string(name, position),
        }
    }

    /// Text form: the flag word appears anywhere in the tokens. Options form: the boolean option.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self {
            Args::Text(tokens) => tokens
                .iter()
                .any(|t| t.eq_ignore_ascii_case(name))
                .then_some(true),
            Args::Options(_) => self.option(name).and_then(|v| v.as_bool()),
        }
    }

    /// Integer token at `position`, or the named integer option
    pub fn integer(&self, name: &str, position: usize) -> Option<i64> {
        match self {
            Args::Text(tokens) => tokens
                .get(position)
                .filter(|t| crate::core::valid_number(t))
                .and_then(|t| t.parse().ok()),
            Args::Options(_) => self.option(name).and_then(|v| v.as_i64()),
        }
    }

    /// Mention token at `position`, or the named user option
    pub fn user(&self, name: &str, position: usize) -> Option<UserId> {
        match self {
            Args::Text(tokens) => tokens.get(position).and_then(|t| parse_user_mention(t)),
            Args::Options(_) => self
                .option(name)
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<u64>().ok())
                .map(UserId),
        }
    }

    /// Arguments rendered for the audit log
    pub fn raw(&self) -> String {
        match self {
            Args::Text(tokens) => tokens.join(" "),
            Args::Options(options) => options
                .iter()
                .map(|opt| match &opt.value {
                    Some(value) => format!("{}={}", opt.name, value),
                    None => opt.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A file to attach to a reply
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Response payload, independent of the input shape
#[derive(Debug, Default)]
pub struct Reply {
    pub content: Option<String>,
    pub embeds: Vec<CreateEmbed>,
    pub files: Vec<FileAttachment>,
    pub ephemeral: bool,
    pub components: Option<CreateComponents>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: CreateEmbed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn with_embed(mut self, embed: CreateEmbed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_file(mut self, filename: impl Into<String>, data: Vec<u8>) -> Self {
        self.files.push(FileAttachment {
            filename: filename.into(),
            data,
        });
        self
    }

    pub fn with_components(mut self, components: CreateComponents) -> Self {
        self.components = Some(components);
        self
    }

    /// Only the invoker sees it (interactions only; messages stay public)
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    fn has_body(&self) -> bool {
        self.content.is_some() || !self.embeds.is_empty()
    }

    fn attachments(&self) -> Vec<AttachmentType<'static>> {
        self.files
            .iter()
            .map(|f| AttachmentType::Bytes {
                data: Cow::Owned(f.data.clone()),
                filename: f.filename.clone(),
            })
            .collect()
    }
}

/// Where the invocation came from
#[derive(Clone, Copy)]
pub enum Source<'a> {
    Message(&'a Message),
    Interaction(&'a ApplicationCommandInteraction),
}

/// Transient per-event context handed to `CommandHandler::run`
pub struct Invocation<'a> {
    pub serenity: &'a Context,
    pub source: Source<'a>,
    pub command: String,
    pub invoker: Invoker,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub args: Args,
    deferred: AtomicBool,
    responded: AtomicBool,
}

impl<'a> Invocation<'a> {
    pub fn new(
        serenity: &'a Context,
        source: Source<'a>,
        command: String,
        invoker: Invoker,
        args: Args,
    ) -> Self {
        let (guild_id, channel_id) = match source {
            Source::Message(msg) => (msg.guild_id, msg.channel_id),
            Source::Interaction(cmd) => (cmd.guild_id, cmd.channel_id),
        };
        Self {
            serenity,
            source,
            command,
            invoker,
            guild_id,
            channel_id,
            args,
            deferred: AtomicBool::new(false),
            responded: AtomicBool::new(false),
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId(self.invoker.user_id)
    }

    /// Acknowledge an interaction early for slow work. No-op for messages.
    pub async fn defer(&self, ephemeral: bool) -> Result<()> {
        if let Source::Interaction(command) = self.source {
            if self.deferred.load(Ordering::SeqCst) || self.responded.load(Ordering::SeqCst) {
                return Ok(());
            }
            command
                .create_interaction_response(&self.serenity.http, |response| {
                    response
                        .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                        .interaction_response_data(|data| data.ephemeral(ephemeral))
                })
                .await?;
            self.deferred.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Send a plain text reply
    pub async fn say(&self, content: impl Into<String>) -> Result<Option<Message>> {
        self.reply(Reply::text(content)).await
    }

    /// Send a text reply only the invoker can see
    pub async fn whisper(&self, content: impl Into<String>) -> Result<Option<Message>> {
        self.reply(Reply::text(content).ephemeral()).await
    }

    /// Send a reply. Returns the posted message when the platform hands one back.
    pub async fn reply(&self, reply: Reply) -> Result<Option<Message>> {
        match self.source {
            Source::Message(msg) => self.send_to_channel(msg.channel_id, reply).await.map(Some),
            Source::Interaction(command) => self.reply_to_interaction(command, reply).await,
        }
    }

    /// Replace the first response (interactions) or post a new message (text commands).
    pub async fn edit(&self, reply: Reply) -> Result<Option<Message>> {
        match self.source {
            Source::Message(msg) => self.send_to_channel(msg.channel_id, reply).await.map(Some),
            Source::Interaction(command) => {
                let fresh =
                    !self.deferred.load(Ordering::SeqCst) && !self.responded.load(Ordering::SeqCst);
                // Edits cannot carry attachments
                if fresh || !reply.files.is_empty() {
                    return self.reply_to_interaction(command, reply).await;
                }
                self.edit_original(command, reply).await.map(Some)
            }
        }
    }

    async fn edit_original(
        &self,
        command: &ApplicationCommandInteraction,
        reply: Reply,
    ) -> Result<Message> {
        let message = command
            .edit_original_interaction_response(&self.serenity.http, |response| {
                if let Some(content) = &reply.content {
                    response.content(content);
                }
                if !reply.embeds.is_empty() {
                    response.set_embeds(reply.embeds.clone());
                }
                if let Some(components) = &reply.components {
                    response.set_components(components.clone());
                }
                response
            })
            .await?;
        self.responded.store(true, Ordering::SeqCst);
        Ok(message)
    }

    /// Post `reply` to any channel, e.g. the invoker's DMs
    pub async fn send_to_channel(&self, channel_id: ChannelId, reply: Reply) -> Result<Message> {
        let files = reply.attachments();
        let message = channel_id
            .send_message(&self.serenity.http, |m| {
                if let Some(content) = &reply.content {
                    m.content(content);
                }
                if !reply.embeds.is_empty() {
                    m.set_embeds(reply.embeds.clone());
                }
                if let Some(components) = &reply.components {
                    m.set_components(components.clone());
                }
                m.add_files(files)
            })
            .await?;
        Ok(message)
    }

    async fn reply_to_interaction(
        &self,
        command: &ApplicationCommandInteraction,
        reply: Reply,
    ) -> Result<Option<Message>> {
        let http = &self.serenity.http;

        if !self.deferred.load(Ordering::SeqCst) && !self.responded.load(Ordering::SeqCst) {
            if reply.files.is_empty() {
                command
                    .create_interaction_response(http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|data| {
                                if let Some(content) = &reply.content {
                                    data.content(content);
                                }
                                if !reply.embeds.is_empty() {
                                    data.set_embeds(reply.embeds.clone());
                                }
                                if let Some(components) = &reply.components {
                                    data.set_components(components.clone());
                                }
                                data.ephemeral(reply.ephemeral)
                            })
                    })
                    .await?;
                self.responded.store(true, Ordering::SeqCst);
                return Ok(None);
            }
            self.defer(reply.ephemeral).await?;
        }

        // The deferred placeholder is replaced by the first edit; files go out as a followup.
        if self.deferred.load(Ordering::SeqCst) && !self.responded.load(Ordering::SeqCst) && reply.has_body() {
            let files = reply.files.clone();
            let message = self
                .edit_original(
                    command,
                    Reply {
                        content: reply.content,
                        embeds: reply.embeds,
                        files: Vec::new(),
                        ephemeral: reply.ephemeral,
                        components: reply.components,
                    },
                )
                .await?;
            if files.is_empty() {
                return Ok(Some(message));
            }
            return self
                .followup(command, Reply {
                    files,
                    ephemeral: reply.ephemeral,
                    ..Reply::default()
                })
                .await
                .map(Some);
        }

        self.followup(command, reply).await.map(Some)
    }

    async fn followup(
        &self,
        command: &ApplicationCommandInteraction,
        reply: Reply,
    ) -> Result<Message> {
        let files = reply.attachments();
        let message = command
            .create_followup_message(&self.serenity.http, |m| {
                if let Some(content) = &reply.content {
                    m.content(content);
                }
                if !reply.embeds.is_empty() {
                    m.set_embeds(reply.embeds.clone());
                }
                if let Some(components) = &reply.components {
                    m.set_components(components.clone());
                }
                m.add_files(files).ephemeral(reply.ephemeral)
            })
            .await?;
        self.responded.store(true, Ordering::SeqCst);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(args: &str) -> Args {
        Args::from_text(args)
    }

    #[test]
    fn test_parse_user_mention_forms() {
        assert_eq!(parse_user_mention("<@123>"), Some(UserId(123)));
        assert_eq!(parse_user_mention("<@!456>"), Some(UserId(456)));
        assert_eq!(parse_user_mention("789"), Some(UserId(789)));
        assert_eq!(parse_user_mention("<#123>"), None);
        assert_eq!(parse_user_mention("@someone"), None);
    }

    #[test]
    fn test_text_string_and_rest() {
        let args = text("docs https://acmucsd.com   Our docs page");
        assert_eq!(args.string("shortlink", 0).as_deref(), Some("docs"));
        assert_eq!(args.string("longlink", 1).as_deref(), Some("https://acmucsd.com"));
        assert_eq!(args.rest("description", 2).as_deref(), Some("Our docs page"));
        assert_eq!(args.rest("description", 5), None);
        assert_eq!(args.raw(), "docs https://acmucsd.com Our docs page");
    }

    #[test]
    fn test_text_flags() {
        let args = text("NOW widescreen");
        assert_eq!(args.flag("now"), Some(true));
        assert_eq!(args.flag("widescreen"), Some(true));
        assert_eq!(args.flag("qr"), None);
    }

    #[test]
    fn test_text_integer_uses_digit_validator() {
        assert_eq!(text("25").integer("members", 0), Some(25));
        assert_eq!(text("-3").integer("members", 0), None);
        assert_eq!(text("2.5").integer("members", 0), None);
    }

    #[test]
    fn test_text_user() {
        let args = text("<@!99> great talk");
        assert_eq!(args.user("to", 0), Some(UserId(99)));
        assert_eq!(args.rest("for", 1).as_deref(), Some("great talk"));
    }

    #[test]
    fn test_empty_text_args() {
        let args = text("   ");
        assert!(args.is_empty());
        assert_eq!(args.string("command", 0), None);
    }

    #[test]
    fn test_reply_builders() {
        let reply = Reply::text("hi").with_file("qr.png", vec![1, 2, 3]).ephemeral();
        assert!(reply.ephemeral);
        assert!(reply.has_body());
        assert_eq!(reply.files.len(), 1);
        assert_eq!(reply.attachments().len(), 1);

        let files_only = Reply::default().with_file("cat.png", vec![0]);
        assert!(!files_only.has_body());
    }
}
