//! Startup wiring for commands and events
//!
//! Commands load in two phases: every handler in the manifest first, then `help`, whose
//! listing is built from the descriptors registered in phase one.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::dispatcher::Dispatcher;
use super::handlers::{create_all_handlers, create_help_handler};
use super::registry::{CommandRegistry, RegistryError};
use crate::events::{EventRegistry, InteractionListener, MessageListener, ReadyListener};

pub struct ActionManager {
    ctx: Arc<CommandContext>,
}

impl ActionManager {
    pub fn new(ctx: Arc<CommandContext>) -> Self {
        Self { ctx }
    }

    /// Build the command registry. A name or alias conflict aborts startup unless the
    /// configured policy lets the later handler win.
    pub fn initialize_commands(&self) -> Result<Arc<CommandRegistry>, RegistryError> {
        let mut registry = CommandRegistry::new(self.ctx.config.duplicate_policy);

        for handler in create_all_handlers(&self.ctx) {
            registry.register(handler)?;
        }

        let help = create_help_handler(&self.ctx, &registry.descriptors());
        registry.register(help)?;

        info!("📋 Loaded {} commands", registry.len());
        Ok(Arc::new(registry))
    }

    /// Listeners for every gateway event the bot handles
    pub fn initialize_events(&self, registry: Arc<CommandRegistry>) -> EventRegistry {
        let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&self.ctx));
        let mut events = EventRegistry::new();
        events.register(Arc::new(ReadyListener::new(
            Arc::clone(&self.ctx.config),
            registry,
        )));
        events.register(Arc::new(MessageListener::new(dispatcher.clone())));
        events.register(Arc::new(InteractionListener::new(dispatcher)));
        events
    }
}
