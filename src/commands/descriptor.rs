//! Command metadata
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use serenity::model::permissions::Permissions;
use std::fmt;

/// Help listing category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Information,
    Utility,
    Picture,
    Jokes,
    Moderation,
    Meme,
    Uncategorized,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Information => "Information",
            Category::Utility => "Utility",
            Category::Picture => "Picture",
            Category::Jokes => "Jokes",
            Category::Moderation => "Moderation",
            Category::Meme => "Meme",
            Category::Uncategorized => "Uncategorized",
        }
    }
}

/// Platform permission a command requires from its invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionTag {
    ViewChannel,
    ReadMessageHistory,
    SendMessages,
    AttachFiles,
    EmbedLinks,
    ManageGuild,
    Administrator,
}

impl PermissionTag {
    pub fn bits(&self) -> Permissions {
        match self {
            PermissionTag::ViewChannel => Permissions::VIEW_CHANNEL,
            PermissionTag::ReadMessageHistory => Permissions::READ_MESSAGE_HISTORY,
            PermissionTag::SendMessages => Permissions::SEND_MESSAGES,
            PermissionTag::AttachFiles => Permissions::ATTACH_FILES,
            PermissionTag::EmbedLinks => Permissions::EMBED_LINKS,
            PermissionTag::ManageGuild => Permissions::MANAGE_GUILD,
            PermissionTag::Administrator => Permissions::ADMINISTRATOR,
        }
    }
}

impl fmt::Display for PermissionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionTag::ViewChannel => "View Channel",
            PermissionTag::ReadMessageHistory => "Read Message History",
            PermissionTag::SendMessages => "Send Messages",
            PermissionTag::AttachFiles => "Attach Files",
            PermissionTag::EmbedLinks => "Embed Links",
            PermissionTag::ManageGuild => "Manage Server",
            PermissionTag::Administrator => "Administrator",
        };
        f.write_str(name)
    }
}

const DEFAULT_PERMISSIONS: &[PermissionTag] =
    &[PermissionTag::ViewChannel, PermissionTag::ReadMessageHistory];

/// Everything the registry, dispatcher and help listing need to know about a command.
///
/// Built once in the handler constructor and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub enabled: bool,
    pub board_required: bool,
    pub description: &'static str,
    pub usage: String,
    pub category: Category,
    pub required_permissions: Vec<PermissionTag>,
}

impl CommandDescriptor {
    /// Start a descriptor; `usage` defaults to the prefixed command name.
    pub fn new(name: &'static str, prefix: &str) -> Self {
        Self {
            name,
            aliases: &[],
            enabled: true,
            board_required: false,
            description: "No information specified.",
            usage: format!("{prefix}{name}"),
            category: Category::Uncategorized,
            required_permissions: DEFAULT_PERMISSIONS.to_vec(),
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Usage text after the prefix, e.g. `acmurl <shortlink> <longlink> [description]`
    pub fn usage(mut self, prefix: &str, usage: &str) -> Self {
        self.usage = format!("{prefix}{usage}");
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn permissions(mut self, tags: &[PermissionTag]) -> Self {
        self.required_permissions = tags.to_vec();
        self
    }

    pub fn board_required(mut self) -> Self {
        self.board_required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Union of the required permission bits
    pub fn permission_bits(&self) -> Permissions {
        self.required_permissions
            .iter()
            .fold(Permissions::empty(), |acc, tag| acc | tag.bits())
    }
}
