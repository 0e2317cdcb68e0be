//! Failure reporting shared by every command
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use log::error;
use thiserror::Error;
use uuid::Uuid;

/// Where a failure came from, used as the `interface` tag in error logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    CatApi,
    DogApi,
    BreadApi,
    PortalApi,
    Yourls,
    GuildIcon,
    Discord,
    Command,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interface::CatApi => "catAPI",
            Interface::DogApi => "dogAPI",
            Interface::BreadApi => "breadAPI",
            Interface::PortalApi => "portalAPI",
            Interface::Yourls => "YOURLS",
            Interface::GuildIcon => "icon",
            Interface::Discord => "discord",
            Interface::Command => "command",
        }
    }
}

/// Log an error under a fresh correlation id and return the id.
pub fn report(interface: Interface, context: &str, err: &anyhow::Error) -> Uuid {
    let error_id = Uuid::new_v4();
    error!(
        "[{error_id}] {context} | interface: {} | error: {err:#}",
        interface.as_str()
    );
    error_id
}

/// User-facing text for a failure; never includes the underlying error.
pub fn failure_message(lead: &str, error_id: Uuid) -> String {
    format!("{lead} *(Error UUID: {error_id})*")
}

/// Image generation failures (QR codes, guild icons)
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not encode QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("icon file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classified platform failures that deserve a specific explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFailure {
    AttachmentTooLarge,
    Other,
}

/// Classify a serenity error.
///
/// The HTTP status is checked first. The message match is a compatibility shim for
/// errors that reach us without a status.
pub fn classify_platform_error(err: &serenity::Error) -> PlatformFailure {
    if let serenity::Error::Http(http_err) = err {
        if let serenity::http::error::Error::UnsuccessfulRequest(response) = http_err.as_ref() {
            if response.status_code.as_u16() == 413 {
                return PlatformFailure::AttachmentTooLarge;
            }
        }
    }
    classify_error_text(&err.to_string())
}

fn classify_error_text(text: &str) -> PlatformFailure {
    if text.contains("Request entity too large") {
        PlatformFailure::AttachmentTooLarge
    } else {
        PlatformFailure::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_carries_id() {
        let id = Uuid::new_v4();
        let message = failure_message("An error occurred when hitting the Cat API.", id);
        assert!(message.starts_with("An error occurred"));
        assert!(message.contains(&id.to_string()));
    }

    #[test]
    fn test_report_returns_distinct_ids() {
        let err = anyhow::anyhow!("boom");
        let a = report(Interface::CatApi, "fetching cat", &err);
        let b = report(Interface::CatApi, "fetching cat", &err);
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_text_shim() {
        assert_eq!(
            classify_error_text("Request entity too large"),
            PlatformFailure::AttachmentTooLarge
        );
        assert_eq!(classify_error_text("Missing Access"), PlatformFailure::Other);
    }

    #[test]
    fn test_interface_tags() {
        assert_eq!(Interface::Yourls.as_str(), "YOURLS");
        assert_eq!(Interface::PortalApi.as_str(), "portalAPI");
    }
}
