//! # Command System
//!
//! Legacy prefixed commands and slash (/) commands, served by the same handlers.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Descriptor-driven handlers, permission gate, dispatcher for both input shapes
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod components;
pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod gate;
pub mod handler;
pub mod handlers;
pub mod invocation;
pub mod manager;
pub mod registry;
pub mod slash;

pub use context::CommandContext;
pub use descriptor::{Category, CommandDescriptor, PermissionTag};
pub use dispatcher::Dispatcher;
pub use handler::CommandHandler;
pub use invocation::{Args, Invocation, Reply};
pub use manager::ActionManager;
pub use registry::{CommandRegistry, RegistryError};
pub use slash::{create_slash_commands, register_guild_commands};
