//! Permission gate
//!
//! Runs before any command body: enabled flag, then board role, then permission bits.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use serenity::model::permissions::Permissions;

use super::descriptor::{CommandDescriptor, PermissionTag};

/// Display name used to find the board role when no role id is configured
pub const BOARD_ROLE_NAME: &str = "Board";

/// A role held by the invoker; the name is only known when the guild is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: u64,
    pub name: Option<String>,
}

/// Who is invoking a command, reduced to what the gate needs.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    pub user_id: u64,
    pub display_name: String,
    pub in_guild: bool,
    pub roles: Vec<RoleRef>,
    /// Effective permissions in the invoking channel; `None` in direct messages or when unresolved
    pub permissions: Option<Permissions>,
    pub is_owner: bool,
}

impl Invoker {
    pub fn has_role(&self, board: &BoardRole) -> bool {
        match board {
            BoardRole::Id(id) => self.roles.iter().any(|r| r.id == *id),
            BoardRole::Named(name) => self
                .roles
                .iter()
                .any(|r| r.name.as_deref() == Some(name.as_str())),
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.is_owner
            || self
                .permissions
                .map(|p| p.contains(Permissions::ADMINISTRATOR))
                .unwrap_or(false)
    }
}

/// How the privileged "board" role is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardRole {
    /// Stable role id
    Id(u64),
    /// Legacy match on the role's display name
    Named(String),
}

impl BoardRole {
    pub fn from_config(role_id: Option<u64>) -> Self {
        match role_id {
            Some(id) => BoardRole::Id(id),
            None => BoardRole::Named(BOARD_ROLE_NAME.to_string()),
        }
    }
}

/// Outcome of the permission gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    /// Disabled commands are treated as unknown
    Disabled,
    NotBoard,
    MissingPermissions(Vec<PermissionTag>),
}

impl Gate {
    /// Message shown to the invoker, if this outcome is user-visible
    pub fn rejection_message(&self) -> Option<String> {
        match self {
            Gate::Allowed | Gate::Disabled => None,
            Gate::NotBoard => Some("You must be a Board member to use this command!".to_string()),
            Gate::MissingPermissions(missing) => Some(format!(
                "You need the following permissions to use this command: {}",
                missing
                    .iter()
                    .map(|tag| tag.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Evaluate the gate for one invocation.
pub fn check(descriptor: &CommandDescriptor, invoker: &Invoker, board: &BoardRole) -> Gate {
    if !descriptor.enabled {
        return Gate::Disabled;
    }

    if descriptor.board_required && !(invoker.in_guild && invoker.has_role(board)) {
        return Gate::NotBoard;
    }

    if invoker.is_administrator() {
        return Gate::Allowed;
    }

    // Direct messages carry no permission set to check against. In a guild, permissions
    // that could not be resolved count as none held.
    if !invoker.in_guild {
        return Gate::Allowed;
    }
    let held = invoker.permissions.unwrap_or_else(Permissions::empty);

    let missing: Vec<PermissionTag> = descriptor
        .required_permissions
        .iter()
        .copied()
        .filter(|tag| !held.contains(tag.bits()))
        .collect();

    if missing.is_empty() {
        Gate::Allowed
    } else {
        Gate::MissingPermissions(missing)
    }
}

#[cfg(test)]
pub(crate) fn member(roles: &[(u64, &str)], permissions: Permissions) -> Invoker {
    Invoker {
        user_id: 7,
        display_name: "member".to_string(),
        in_guild: true,
        roles: roles
            .iter()
            .map(|(id, name)| RoleRef {
                id: *id,
                name: Some(name.to_string()),
            })
            .collect(),
        permissions: Some(permissions),
        is_owner: false,
    }
}
