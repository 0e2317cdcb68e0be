//! Check-in command handler
//!
//! Sends today's check-in codes privately, or the codes of live events publicly, with
//! express check-in links and optional QR codes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::info;
use serenity::builder::{CreateApplicationCommand, CreateEmbed};
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::descriptor::{Category, CommandDescriptor, PermissionTag};
use crate::commands::handler::{base_definition, CommandHandler};
use crate::commands::invocation::{Invocation, Reply};
use crate::commands::slash::bool_option;
use crate::core::embeds::INFO_COLOR;
use crate::core::errors::{failure_message, report, Interface};
use crate::core::truncate_for_embed;
use crate::features::league_time::start_of_pacific_day;
use crate::features::portal::PortalEvent;
use crate::features::qr::{qr_png, slide_png};

pub struct CheckinHandler {
    descriptor: CommandDescriptor,
}

impl CheckinHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            descriptor: CommandDescriptor::new("checkin", prefix)
                .description("Sends a private message with all check-in codes from today's events. Calling with `now` argument sends public embed of checkin code if any events are now live!")
                .usage(prefix, "checkin [now] [widescreen]")
                .category(Category::Utility)
                .permissions(&[PermissionTag::SendMessages])
                .board_required(),
        }
    }
}

/// Events starting during the Pacific calendar day that contains `now`
pub fn todays_events(events: &[PortalEvent], now: DateTime<Utc>) -> Vec<PortalEvent> {
    let midnight = start_of_pacific_day(now);
    let tomorrow = midnight + Duration::days(1);
    events
        .iter()
        .filter(|event| event.starts_within(midnight, tomorrow))
        .cloned()
        .collect()
}

pub fn live_events(events: &[PortalEvent], now: DateTime<Utc>) -> Vec<PortalEvent> {
    events.iter().filter(|event| event.is_live(now)).cloned().collect()
}

/// Embed body: linked title and code for every event, blank line between events
pub fn checkin_description(events: &[PortalEvent]) -> String {
    events
        .iter()
        .map(|event| {
            format!(
                "*[{}]({})*\n**Checkin Code: `{}`**",
                event.title,
                event.express_checkin_url(),
                event.attendance_code
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Attachment name for an event's QR code
fn qr_filename(event: &PortalEvent) -> String {
    let code: String = event
        .attendance_code
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("checkin-{code}.png")
}

fn checkin_embed(events: &[PortalEvent], public: bool) -> CreateEmbed {
    let title = if public {
        ":calendar_spiral: Don't forget to check in!"
    } else {
        ":calendar_spiral: Today's Events"
    };
    let mut embed = CreateEmbed::default();
    embed
        .title(title)
        .description(truncate_for_embed(&checkin_description(events)))
        .color(INFO_COLOR);
    embed
}

fn checkin_reply(events: &[PortalEvent], public: bool, with_qr: bool, widescreen: bool) -> Result<Reply> {
    let mut reply = Reply::embed(checkin_embed(events, public));
    if with_qr {
        for event in events {
            let url = event.express_checkin_url();
            let png = if widescreen { slide_png(&url)? } else { qr_png(&url)? };
            reply = reply.with_file(qr_filename(event), png);
        }
    }
    Ok(reply)
}

#[async_trait]
impl CommandHandler for CheckinHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn definition(&self) -> Option<CreateApplicationCommand> {
        let mut command = base_definition(&self.descriptor);
        bool_option(&mut command, "now", "If true, send public embed of checkin code for live events!");
        bool_option(&mut command, "qr", "If possible, include a QR code for Express Check-In in embed.");
        bool_option(&mut command, "widescreen", "Put each QR code on a 16:9 slide for projecting.");
        Some(command)
    }

    async fn run(&self, ctx: Arc<CommandContext>, invocation: &Invocation<'_>) -> Result<()> {
        let public = invocation.args.flag("now").unwrap_or(false);
        let with_qr = invocation.args.flag("qr").unwrap_or(true);
        let widescreen = invocation.args.flag("widescreen").unwrap_or(false);

        invocation.defer(!public).await?;

        let events = match ctx.portal.future_events().await {
            Ok(events) => events,
            Err(e) => {
                let error_id = report(
                    Interface::PortalApi,
                    "Error whilst fetching future events",
                    &anyhow::Error::new(e),
                );
                invocation
                    .edit(
                        Reply::text(failure_message(
                            "An error occurred when attempting to query the event data from the portal API.",
                            error_id,
                        ))
                        .ephemeral(),
                    )
                    .await?;
                return Ok(());
            }
        };

        let now = Utc::now();
        if public {
            let live = live_events(&events, now);
            if live.is_empty() {
                invocation.edit(Reply::text("No events right now!")).await?;
                return Ok(());
            }
            invocation
                .edit(checkin_reply(&live, true, with_qr, widescreen)?)
                .await?;
            return Ok(());
        }

        let today = todays_events(&events, now);
        if today.is_empty() {
            invocation
                .edit(Reply::text("No events today!").ephemeral())
                .await?;
            return Ok(());
        }

        let dm = invocation
            .user_id()
            .create_dm_channel(invocation.serenity)
            .await?;
        invocation
            .send_to_channel(dm.id, checkin_reply(&today, false, with_qr, widescreen)?)
            .await?;
        info!(
            "Sent {} check-in code(s) to {}",
            today.len(),
            invocation.invoker.user_id
        );
        invocation
            .edit(Reply::text("Check your DM.").ephemeral())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(title: &str, code: &str, start: DateTime<Utc>, hours: i64) -> PortalEvent {
        PortalEvent {
            uuid: title.to_lowercase(),
            title: title.to_string(),
            description: String::new(),
            location: String::new(),
            community: "General".to_string(),
            attendance_code: code.to_string(),
            start,
            end: start + Duration::hours(hours),
        }
    }

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_today_uses_pacific_day() {
        // 2024-05-01 20:00 UTC is 13:00 PDT on May 1
        let now = utc(1, 20);
        let events = vec![
            event("Morning", "a", utc(1, 16), 1),  // 09:00 PDT May 1
            event("Late", "b", utc(2, 5), 2),      // 22:00 PDT May 1
            event("Tomorrow", "c", utc(2, 8), 1),  // 01:00 PDT May 2
            event("Yesterday", "d", utc(1, 5), 1), // 22:00 PDT Apr 30
        ];
        let titles: Vec<String> = todays_events(&events, now)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Morning", "Late"]);
    }

    #[test]
    fn test_live_events() {
        let events = vec![
            event("Running", "a", utc(1, 19), 2),
            event("Later", "b", utc(1, 22), 2),
        ];
        let live = live_events(&events, utc(1, 20));
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].title, "Running");
    }

    #[test]
    fn test_description_lists_links_and_codes() {
        let events = vec![
            event("Hack Night", "pizza", utc(1, 19), 2),
            event("Social", "boba", utc(1, 22), 2),
        ];
        let text = checkin_description(&events);
        assert!(text.starts_with("*[Hack Night](https://members.acmucsd.com/checkin?code=pizza)*"));
        assert!(text.contains("**Checkin Code: `boba`**"));
        assert_eq!(text.matches("\n\n").count(), 1);
    }

    #[test]
    fn test_qr_filename_is_safe() {
        let e = event("Social", "free food/2", utc(1, 22), 1);
        assert_eq!(qr_filename(&e), "checkin-free_food_2.png");
    }

    #[test]
    fn test_reply_attaches_one_qr_per_event() {
        let events = vec![
            event("A", "a", utc(1, 19), 2),
            event("B", "b", utc(1, 19), 2),
        ];
        let reply = checkin_reply(&events, true, true, false).unwrap();
        assert_eq!(reply.files.len(), 2);
        let without = checkin_reply(&events, true, false, false).unwrap();
        assert!(without.files.is_empty());
    }
}
