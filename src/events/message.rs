//! Message listener: legacy prefixed commands and bot mentions

use anyhow::Result;
use async_trait::async_trait;
use serenity::prelude::Context;

use super::{BotEvent, EventKind, EventListener};
use crate::commands::dispatcher::Dispatcher;

pub struct MessageListener {
    dispatcher: Dispatcher,
}

impl MessageListener {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventListener for MessageListener {
    fn kind(&self) -> EventKind {
        EventKind::Message
    }

    fn name(&self) -> &'static str {
        "message"
    }

    async fn handle(&self, ctx: &Context, event: &BotEvent<'_>) -> Result<()> {
        let BotEvent::Message(msg) = event else {
            return Ok(());
        };
        if msg.author.bot {
            return Ok(());
        }
        self.dispatcher.handle_message(ctx, msg).await
    }
}
