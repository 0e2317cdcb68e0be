//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 3.0.0: Club command set (pictures, checkin, match, everyone, coverup, kudos); help built last
//! - 2.0.0: Remove AiChatHandler (hey, explain, simple, steps, recipe) - consolidated into /ask
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod checkin;
pub mod everyone;
pub mod fun;
pub mod info;
pub mod matchmaking;
pub mod pictures;
pub mod utility;

use std::sync::Arc;

use super::context::CommandContext;
use super::descriptor::CommandDescriptor;
use super::handler::CommandHandler;
use crate::features::pictures::PictureSource;

/// Create every handler except `help`
///
/// Returns a vector of handlers ready to be registered with CommandRegistry. `help`
/// needs the finished registry, see [`create_help_handler`].
pub fn create_all_handlers(ctx: &CommandContext) -> Vec<Arc<dyn CommandHandler>> {
    let prefix = ctx.prefix();
    vec![
        Arc::new(utility::PingHandler::new(prefix)),
        Arc::new(utility::EchoHandler::new(prefix)),
        Arc::new(utility::AcmurlHandler::new(ctx)),
        Arc::new(utility::QrHandler::new(prefix)),
        Arc::new(utility::ReportHandler::new(prefix)),
        Arc::new(pictures::PictureHandler::new(prefix, PictureSource::Cat)),
        Arc::new(pictures::PictureHandler::new(prefix, PictureSource::Dog)),
        Arc::new(pictures::PictureHandler::new(prefix, PictureSource::Bread)),
        Arc::new(checkin::CheckinHandler::new(prefix)),
        Arc::new(info::TopHandler::new(prefix)),
        Arc::new(info::IsLeagueTimeHandler::new(prefix)),
        Arc::new(matchmaking::MatchHandler::new(prefix, ctx.config.match_role_id)),
        Arc::new(everyone::EveryoneHandler::new(
            prefix,
            ctx.config.guild_icon_dir.clone(),
        )),
        Arc::new(fun::CoverupHandler::new(prefix)),
        Arc::new(fun::KudosHandler::new(prefix)),
        Arc::new(fun::UcsdHandler::new(prefix)),
    ]
}

/// `help` over the descriptors of everything registered so far
pub fn create_help_handler(ctx: &CommandContext, registered: &[CommandDescriptor]) -> Arc<dyn CommandHandler> {
    Arc::new(info::HelpHandler::new(ctx.prefix(), registered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::test_context;
    use std::collections::HashSet;

    #[test]
    fn test_manifest_names_are_unique() {
        let ctx = test_context();
        let handlers = create_all_handlers(&ctx);
        let mut seen = HashSet::new();
        for handler in &handlers {
            let descriptor = handler.descriptor();
            assert!(seen.insert(descriptor.name), "duplicate {}", descriptor.name);
            for alias in descriptor.aliases {
                assert!(seen.insert(*alias), "duplicate alias {alias}");
            }
        }
        assert!(!seen.contains("help"));
        assert!(seen.contains("ucsandiego"));
    }

    #[test]
    fn test_every_command_publishes_a_schema() {
        let ctx = test_context();
        for handler in create_all_handlers(&ctx) {
            assert!(
                handler.definition().is_some(),
                "{} has no schema",
                handler.descriptor().name
            );
        }
    }
}
