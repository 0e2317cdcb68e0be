//! Button rows for confirmation prompts and paged embeds
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Scope custom ids per prompt, parse clicks back into actions
//! - 1.0.0: Initial confirmation and pagination buttons

use serenity::builder::CreateComponents;
use serenity::model::application::component::ButtonStyle;

/// Custom id of the confirm button for `action_id`
pub fn confirm_id(action_id: &str) -> String {
    format!("confirm_{action_id}")
}

/// Custom id of the cancel button for `action_id`
pub fn cancel_id(action_id: &str) -> String {
    format!("cancel_{action_id}")
}

/// Yes/no buttons. `disabled` greys both out once the prompt is answered or expired.
pub fn confirmation_buttons(action_id: &str, disabled: bool) -> CreateComponents {
    CreateComponents::default()
        .create_action_row(|row| {
            row.create_button(|button| {
                button
                    .custom_id(confirm_id(action_id))
                    .label("Yes")
                    .style(ButtonStyle::Success)
                    .disabled(disabled)
            })
            .create_button(|button| {
                button
                    .custom_id(cancel_id(action_id))
                    .label("No")
                    .style(ButtonStyle::Danger)
                    .disabled(disabled)
            })
        })
        .to_owned()
}

/// `Some(true)` for the confirm button, `Some(false)` for cancel, `None` for any other id
pub fn confirmation_choice(custom_id: &str, action_id: &str) -> Option<bool> {
    if custom_id == confirm_id(action_id) {
        Some(true)
    } else if custom_id == cancel_id(action_id) {
        Some(false)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    First,
    Prev,
    Next,
    Last,
}

impl PageAction {
    fn key(&self) -> &'static str {
        match self {
            PageAction::First => "first",
            PageAction::Prev => "prev",
            PageAction::Next => "next",
            PageAction::Last => "last",
        }
    }

    fn custom_id(&self, action_id: &str) -> String {
        format!("page_{}_{action_id}", self.key())
    }

    /// Parse a pagination button id belonging to `action_id`
    pub fn parse(custom_id: &str, action_id: &str) -> Option<Self> {
        [PageAction::First, PageAction::Prev, PageAction::Next, PageAction::Last]
            .into_iter()
            .find(|action| action.custom_id(action_id) == custom_id)
    }

    /// Zero-based page after applying the action, clamped to `[0, total)`
    pub fn apply(&self, current: usize, total: usize) -> usize {
        let last = total.saturating_sub(1);
        match self {
            PageAction::First => 0,
            PageAction::Prev => current.saturating_sub(1),
            PageAction::Next => (current + 1).min(last),
            PageAction::Last => last,
        }
    }
}

/// First/previous/position/next/last buttons for zero-based page `current` of `total`.
/// `disabled` greys out the whole row once the paginator stops listening.
pub fn pagination_buttons(
    action_id: &str,
    current: usize,
    total: usize,
    disabled: bool,
) -> CreateComponents {
    let at_start = disabled || current == 0;
    let at_end = disabled || current + 1 >= total;

    CreateComponents::default()
        .create_action_row(|row| {
            row.create_button(|button| {
                button
                    .custom_id(PageAction::First.custom_id(action_id))
                    .label("⏮️")
                    .style(ButtonStyle::Secondary)
                    .disabled(at_start)
            })
            .create_button(|button| {
                button
                    .custom_id(PageAction::Prev.custom_id(action_id))
                    .label("⬅️")
                    .style(ButtonStyle::Secondary)
                    .disabled(at_start)
            })
            .create_button(|button| {
                button
                    .custom_id(format!("page_info_{action_id}"))
                    .label(format!("{}/{}", current + 1, total))
                    .style(ButtonStyle::Secondary)
                    .disabled(true)
            })
            .create_button(|button| {
                button
                    .custom_id(PageAction::Next.custom_id(action_id))
                    .label("➡️")
                    .style(ButtonStyle::Secondary)
                    .disabled(at_end)
            })
            .create_button(|button| {
                button
                    .custom_id(PageAction::Last.custom_id(action_id))
                    .label("⏭️")
                    .style(ButtonStyle::Secondary)
                    .disabled(at_end)
            })
        })
        .to_owned()
}
