//! Picture command handlers
//!
//! Handles: cat, dog, bread
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use async_trait::async_trait;
use log::error;
use serenity::builder::CreateApplicationCommand;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::{Invocation, Reply};
use crate::core::errors::{failure_message, report};
use crate::features::pictures::{fetch_picture, PictureSource};

/// One handler type serves all three picture commands.
pub struct PictureHandler {
    descriptor: CommandDescriptor,
    source: PictureSource,
}

impl PictureHandler {
    pub fn new(prefix: &str, source: PictureSource) -> Self {
        let descriptor = match source {
            PictureSource::Cat => CommandDescriptor::new("cat", prefix).description(
                "Returns a random cute cat picture fetched from The Cat API. (https://thecatapi.com/)",
            ),
            PictureSource::Dog => CommandDescriptor::new("dog", prefix).description(
                "Returns a random cute dog picture fetched from the Dog API. (https://dog.ceo/dog-api/)",
            ),
            PictureSource::Bread => CommandDescriptor::new("bread", prefix).description(
                "Returns a random bread picture fetched from the Unsplash API. (https://api.unsplash.com/). Notoriously inaccurate at classifying bread.",
            ),
        };

        Self {
            descriptor: descriptor
                .category(Category::Picture)
                .permissions(&[PermissionTag::AttachFiles, PermissionTag::EmbedLinks]),
            source,
        }
    }
}

#[async_trait]
impl CommandHandler for PictureHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        Some(base_definition(&self.descriptor))
    }

    async fn run(&self, ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        invocation.defer(false).await?;

        match fetch_picture(&ctx.http, &ctx.config.api_keys, self.source).await {
            Ok(Some(picture)) => {
                invocation
                    .edit(Reply::default().with_file(picture.filename, picture.bytes))
                    .await?;
            }
            Ok(None) => {
                error!(
                    "Error when returning response for '{}' command: undefined URL for image | interface: {}",
                    self.descriptor.name,
                    self.source.interface().as_str()
                );
                invocation.edit(Reply::text(self.source.missing_message())).await?;
            }
            Err(e) => {
                let error_id = report(
                    self.source.interface(),
                    &format!("Error whilst fetching image URL for '{}'", self.descriptor.name),
                    &e,
                );
                invocation
                    .edit(Reply::text(failure_message(self.source.failure_lead(), error_id)))
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_follow_source() {
        let names: Vec<&str> = [PictureSource::Cat, PictureSource::Dog, PictureSource::Bread]
            .into_iter()
            .map(|source| PictureHandler::new("!", source).descriptor().name)
            .collect();
        assert_eq!(names, vec!["cat", "dog", "bread"]);
    }

    #[test]
    fn test_pictures_need_attach_files() {
        let handler = PictureHandler::new("!", PictureSource::Bread);
        assert_eq!(handler.descriptor().category, Category::Picture);
        assert!(handler
            .descriptor()
            .required_permissions
            .contains(&PermissionTag::AttachFiles));
    }
}
