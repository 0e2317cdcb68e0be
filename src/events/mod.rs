//! # Events
//!
//! Lifecycle listeners and the serenity `EventHandler` that fans gateway events out to them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: false

pub mod interaction;
pub mod message;
pub mod ready;

use anyhow::Result;
use async_trait::async_trait;
use log::error;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use std::collections::HashMap;
use std::sync::Arc;

pub use interaction::InteractionListener;
pub use message::MessageListener;
pub use ready::ReadyListener;

/// Gateway events the bot listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Message,
    InteractionCreate,
}

/// Payload handed to listeners, borrowed from the serenity callback
pub enum BotEvent<'a> {
    Ready(&'a Ready),
    Message(&'a Message),
    InteractionCreate(&'a Interaction),
}

impl BotEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            BotEvent::Ready(_) => EventKind::Ready,
            BotEvent::Message(_) => EventKind::Message,
            BotEvent::InteractionCreate(_) => EventKind::InteractionCreate,
        }
    }
}

/// One lifecycle listener. It is only called for events of its own kind.
#[async_trait]
pub trait EventListener: Send + Sync {
    fn kind(&self) -> EventKind;

    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &Context, event: &BotEvent<'_>) -> Result<()>;
}

/// Listeners grouped by the event kind they declare
#[derive(Default, Clone)]
pub struct EventRegistry {
    listeners: HashMap<EventKind, Vec<Arc<dyn EventListener>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.entry(listener.kind()).or_default().push(listener);
    }

    pub fn listeners(&self, kind: EventKind) -> &[Arc<dyn EventListener>] {
        self.listeners.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run every listener registered for the event's kind, in registration order.
    /// A failing listener is logged and does not stop the others.
    pub async fn dispatch(&self, ctx: &Context, event: BotEvent<'_>) {
        for listener in self.listeners(event.kind()) {
            if let Err(e) = listener.handle(ctx, &event).await {
                error!("❌ Listener '{}' failed: {e:#}", listener.name());
            }
        }
    }
}

/// serenity-facing handler
pub struct Handler {
    events: Arc<EventRegistry>,
}

impl Handler {
    pub fn new(events: Arc<EventRegistry>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.events.dispatch(&ctx, BotEvent::Ready(&ready)).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        self.events.dispatch(&ctx, BotEvent::Message(&msg)).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        self.events
            .dispatch(&ctx, BotEvent::InteractionCreate(&interaction))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(EventKind, &'static str);

    #[async_trait]
    impl EventListener for Named {
        fn kind(&self) -> EventKind {
            self.0
        }

        fn name(&self) -> &'static str {
            self.1
        }

        async fn handle(&self, _ctx: &Context, _event: &BotEvent<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_listeners_grouped_by_kind() {
        let mut registry = EventRegistry::new();
        registry.register(Arc::new(Named(EventKind::Message, "first")));
        registry.register(Arc::new(Named(EventKind::Ready, "ready")));
        registry.register(Arc::new(Named(EventKind::Message, "second")));

        let names: Vec<&str> = registry
            .listeners(EventKind::Message)
            .iter()
            .map(|l| l.name())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.listeners(EventKind::Ready).len(), 1);
        assert!(registry.listeners(EventKind::InteractionCreate).is_empty());
    }
}
