//! Interaction listener: application commands go to the dispatcher

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::model::application::interaction::Interaction;
use serenity::prelude::Context;

use super::{BotEvent, EventKind, EventListener};
use crate::commands::dispatcher::Dispatcher;

pub struct InteractionListener {
    dispatcher: Dispatcher,
}

impl InteractionListener {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventListener for InteractionListener {
    fn kind(&self) -> EventKind {
        EventKind::InteractionCreate
    }

    fn name(&self) -> &'static str {
        "interaction"
    }

    async fn handle(&self, ctx: &Context, event: &BotEvent<'_>) -> Result<()> {
        match event {
            BotEvent::InteractionCreate(Interaction::ApplicationCommand(command)) => {
                self.dispatcher.handle_interaction(ctx, command).await
            }
            // Button presses are picked up by the collectors of the command that posted them.
            BotEvent::InteractionCreate(other) => {
                debug!("Ignoring interaction {:?}", other.kind());
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
