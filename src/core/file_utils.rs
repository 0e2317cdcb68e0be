//! File download helpers for Discord re-uploads
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.2.0
//!
//! ## Changelog
//! - 2.0.0: Download through the shared `reqwest::Client`, drop content sniffing
//! - 1.0.0: Initial creation with download, content detection, and file utilities

use anyhow::{anyhow, Result};
use log::{debug, warn};

/// Discord upload limit for servers with no boost or boost tier 1 (25 MB)
pub const DISCORD_UPLOAD_LIMIT: u64 = 25 * 1024 * 1024;

/// A file downloaded from a URL, ready for Discord upload
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// Download `url` into memory, refusing bodies larger than `max_bytes`.
pub async fn download_file(
    http: &reqwest::Client,
    url: &str,
    max_bytes: u64,
) -> Result<DownloadedFile> {
    let response = http.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            anyhow!("Request for {url} timed out")
        } else if e.is_connect() {
            anyhow!("Could not connect to the server")
        } else {
            anyhow!("HTTP request failed: {e}")
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("Server returned HTTP {status}"));
    }

    if let Some(content_length) = response.content_length() {
        if content_length > max_bytes {
            return Err(anyhow!(
                "File is too large ({}, limit {})",
                format_file_size(content_length),
                format_file_size(max_bytes)
            ));
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    debug!("Downloading file from {url} (Content-Type: {content_type})");

    let bytes = response.bytes().await?;
    let size = bytes.len() as u64;
    if size > max_bytes {
        return Err(anyhow!(
            "File is too large ({}, limit {})",
            format_file_size(size),
            format_file_size(max_bytes)
        ));
    }
    if size == 0 {
        warn!("Downloaded file from {url} is empty");
    }

    Ok(DownloadedFile {
        bytes: bytes.to_vec(),
        filename: extract_filename(url),
        content_type,
    })
}

/// Last segment of the URL path, or `"download"` when it has no extension.
pub fn extract_filename(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let path = path.split('#').next().unwrap_or(path);
    match path.rsplit('/').next() {
        Some(segment) if segment.contains('.') && !segment.ends_with('.') => segment.to_string(),
        _ => "download".to_string(),
    }
}

/// Format a byte count as a human-readable string (e.g., "1.5 MB", "340 KB").
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_filename_from_url() {
        assert_eq!(
            extract_filename("https://cdn2.thecatapi.com/images/9j5.jpg"),
            "9j5.jpg"
        );
        assert_eq!(
            extract_filename("https://images.dog.ceo/breeds/hound-afghan/n02088094_1003.jpg?x=1"),
            "n02088094_1003.jpg"
        );
    }

    #[test]
    fn test_extract_filename_fallback() {
        assert_eq!(
            extract_filename("https://images.unsplash.com/photo-1509440159596?ixid=abc"),
            "download"
        );
        assert_eq!(extract_filename("https://example.com/"), "download");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(DISCORD_UPLOAD_LIMIT), "25.0 MB");
    }
}
