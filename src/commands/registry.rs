//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Separate name and alias maps, duplicate detection with a configurable policy
//! - 1.0.0: Initial implementation for handler dispatch

use log::warn;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::descriptor::CommandDescriptor;
use super::handler::CommandHandler;
use crate::core::DuplicatePolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("'{key}' is claimed by both '{existing}' and '{incoming}'")]
    Duplicate {
        key: String,
        existing: &'static str,
        incoming: &'static str,
    },
}

/// Registry mapping command names and aliases to handlers
///
/// Both maps hold the same `Arc` for a handler with aliases. The registry is filled once
/// at startup and only read afterwards.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
/// registry.register(Arc::new(CatHandler::new(&config)))?;
///
/// if let Some(handler) = registry.get("cat") {
///     handler.run(ctx, &invocation).await?;
/// }
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    policy: DuplicatePolicy,
    commands: HashMap<&'static str, Arc<dyn CommandHandler>>,
    aliases: HashMap<&'static str, Arc<dyn CommandHandler>>,
    /// Command names in registration order, for help and schema publishing
    order: Vec<&'static str>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            commands: HashMap::new(),
            aliases: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a handler under its name and every alias
    ///
    /// With `DuplicatePolicy::Fail` nothing is inserted when any key collides.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), RegistryError> {
        let descriptor = handler.descriptor();
        let name = descriptor.name;

        let conflicts = self.conflicts(descriptor);
        if let Some(&(key, existing)) = conflicts.first() {
            match self.policy {
                DuplicatePolicy::Fail => {
                    return Err(RegistryError::Duplicate {
                        key: key.to_string(),
                        existing,
                        incoming: name,
                    });
                }
                DuplicatePolicy::LastWins => {
                    for (key, existing) in &conflicts {
                        warn!("Command key '{key}' of '{existing}' replaced by '{name}'");
                    }
                    if self.commands.contains_key(name) {
                        self.remove(name);
                    }
                }
            }
        }

        self.commands.insert(name, Arc::clone(&handler));
        for alias in descriptor.aliases {
            self.aliases.insert(*alias, Arc::clone(&handler));
        }
        self.order.push(name);
        Ok(())
    }

    /// Keys of `descriptor` that are already taken, with the owning command name
    fn conflicts(&self, descriptor: &CommandDescriptor) -> Vec<(&'static str, &'static str)> {
        let keys: Vec<&'static str> = std::iter::once(descriptor.name)
            .chain(descriptor.aliases.iter().copied())
            .collect();

        let mut found = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let owner = self
                .commands
                .get(key)
                .or_else(|| self.aliases.get(key))
                .map(|h| h.descriptor().name);
            match owner {
                Some(owner) => found.push((*key, owner)),
                None if keys[..i].contains(key) => found.push((*key, descriptor.name)),
                None => {}
            }
        }
        found
    }

    fn remove(&mut self, name: &str) {
        self.commands.remove(name);
        self.aliases.retain(|_, h| h.descriptor().name != name);
        self.order.retain(|n| *n != name);
    }

    /// Get handler for a command name or alias
    ///
    /// Names take precedence over aliases.
    pub fn get(&self, key: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands
            .get(key)
            .or_else(|| self.aliases.get(key))
            .cloned()
    }

    /// Check if a name or alias is registered
    pub fn contains(&self, key: &str) -> bool {
        self.commands.contains_key(key) || self.aliases.contains_key(key)
    }

    /// Number of registered commands (aliases not counted)
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Handlers in registration order
    pub fn handlers(&self) -> Vec<Arc<dyn CommandHandler>> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name).cloned())
            .collect()
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<CommandDescriptor> {
        self.handlers()
            .iter()
            .map(|h| h.descriptor().clone())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::commands::context::CommandContext;
    use crate::commands::invocation::Invocation;
    use anyhow::Result;
    use async_trait::async_trait;

    pub(crate) struct MockHandler {
        pub descriptor: CommandDescriptor,
    }

    impl MockHandler {
        pub(crate) fn named(name: &'static str, aliases: &'static [&'static str]) -> Arc<Self> {
            Arc::new(Self {
                descriptor: CommandDescriptor::new(name, "!").aliases(aliases),
            })
        }
    }

    #[async_trait]
    impl CommandHandler for MockHandler {
        fn descriptor(&self) -> &CommandDescriptor {
            &self.descriptor
        }

        async fn run(&self, _ctx: Arc<CommandContext>, _invocation: &Invocation<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new(DuplicatePolicy::Fail);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_single() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        registry.register(MockHandler::named("ping", &[])).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("ping"));
        assert!(!registry.contains("pong"));
    }

    #[test]
    fn test_alias_resolves_to_same_handler() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        registry
            .register(MockHandler::named("ucsd", &["ucsandiego"]))
            .unwrap();

        let by_name = registry.get("ucsd").unwrap();
        let by_alias = registry.get("ucsandiego").unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_alias));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_fails_fast() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        registry.register(MockHandler::named("cat", &[])).unwrap();
        let err = registry.register(MockHandler::named("cat", &[])).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                key: "cat".to_string(),
                existing: "cat",
                incoming: "cat",
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_alias_colliding_with_name_is_conflict() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        registry.register(MockHandler::named("dog", &[])).unwrap();
        let err = registry
            .register(MockHandler::named("puppy", &["dog"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { existing: "dog", incoming: "puppy", .. }));
        assert!(!registry.contains("puppy"));
    }

    #[test]
    fn test_name_colliding_with_alias_is_conflict() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        registry
            .register(MockHandler::named("ucsd", &["ucsandiego"]))
            .unwrap();
        assert!(registry.register(MockHandler::named("ucsandiego", &[])).is_err());
    }

    #[test]
    fn test_last_wins_replaces_handler_and_its_aliases() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::LastWins);
        registry.register(MockHandler::named("help", &["h"])).unwrap();
        let replacement: Arc<dyn CommandHandler> = MockHandler::named("help", &[]);
        registry.register(Arc::clone(&replacement)).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("h"));
        assert!(Arc::ptr_eq(&registry.get("help").unwrap(), &replacement));
    }

    #[test]
    fn test_alias_repeating_own_name_is_conflict() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        assert!(registry.register(MockHandler::named("top", &["top"])).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_descriptors_keep_registration_order() {
        let mut registry = CommandRegistry::new(DuplicatePolicy::Fail);
        for name in ["cat", "dog", "bread"] {
            registry.register(MockHandler::named(name, &[])).unwrap();
        }
        let names: Vec<_> = registry.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["cat", "dog", "bread"]);
    }
}
