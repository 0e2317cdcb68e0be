//! Argument validators
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use reqwest::Url;

/// True when `input` parses as an absolute URL with an `http` or `https` scheme.
pub fn valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// True when `input` is non-empty and made only of ASCII digits.
pub fn valid_number(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}
