//! Picture API calls
//!
//! Each source is one GET returning JSON with the image URL at a known path. The image
//! is then downloaded so it can be uploaded as an attachment.

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde_json::Value;

use crate::core::config::ApiKeys;
use crate::core::errors::Interface;
use crate::core::file_utils::{download_file, DISCORD_UPLOAD_LIMIT};

const CAT_API_URL: &str = "https://api.thecatapi.com/v1/images/search";
const DOG_API_URL: &str = "https://dog.ceo/api/breeds/image/random";
const BREAD_API_URL: &str = "https://api.unsplash.com/photos/random?query=bread";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureSource {
    Cat,
    Dog,
    Bread,
}

impl PictureSource {
    pub fn interface(&self) -> Interface {
        match self {
            PictureSource::Cat => Interface::CatApi,
            PictureSource::Dog => Interface::DogApi,
            PictureSource::Bread => Interface::BreadApi,
        }
    }

    /// Shown with an error id when the API call fails
    pub fn failure_lead(&self) -> &'static str {
        match self {
            PictureSource::Cat => "An error occurred when hitting the Cat API.",
            PictureSource::Dog => "An error occurred when hitting the Dog API.",
            PictureSource::Bread => "An error occurred when fetching from Unsplash.",
        }
    }

    /// Shown when the API answered but without an image URL
    pub fn missing_message(&self) -> &'static str {
        match self {
            PictureSource::Cat => "I can't find a cat image right now. It's possible I got rate-limited (asked for too many cat pics this month).",
            PictureSource::Dog => "I can't find a dog image right now. This shouldn't happen. Blame my maintainer.",
            PictureSource::Bread => "I can't find a bread image right now. It's possible I got rate-limited (asked for too many bread pics this month).",
        }
    }

    fn request(&self, http: &reqwest::Client, keys: &ApiKeys) -> reqwest::RequestBuilder {
        match self {
            PictureSource::Cat => {
                let request = http.get(CAT_API_URL);
                match &keys.cat_api {
                    Some(key) => request.header("x-api-key", key),
                    None => request,
                }
            }
            PictureSource::Dog => http.get(DOG_API_URL),
            PictureSource::Bread => {
                let request = http.get(BREAD_API_URL);
                match &keys.unsplash {
                    Some(key) => request.header("Authorization", format!("Client-ID {key}")),
                    None => request,
                }
            }
        }
    }
}

/// Pull the image URL out of an API payload.
pub fn extract_url(source: PictureSource, payload: &Value) -> Option<String> {
    let url = match source {
        PictureSource::Cat => payload.get(0)?.get("url")?,
        PictureSource::Dog => payload.get("message")?,
        PictureSource::Bread => payload.get("urls")?.get("full")?,
    };
    url.as_str()
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// A downloaded picture ready to upload
#[derive(Debug, Clone)]
pub struct Picture {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fetch one random picture. `Ok(None)` when the API returned no usable URL.
pub async fn fetch_picture(
    http: &reqwest::Client,
    keys: &ApiKeys,
    source: PictureSource,
) -> Result<Option<Picture>> {
    let payload: Value = source
        .request(http, keys)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .with_context(|| format!("{} returned a non-JSON body", source.interface().as_str()))?;

    let Some(url) = extract_url(source, &payload) else {
        return Ok(None);
    };
    debug!("{} picture: {url}", source.interface().as_str());

    let file = download_file(http, &url, DISCORD_UPLOAD_LIMIT).await?;
    if file.bytes.is_empty() {
        return Err(anyhow!("image at {url} is empty"));
    }

    // Unsplash URLs have no extension, so Discord would not render them inline
    let filename = match source {
        PictureSource::Bread => "bread.png".to_string(),
        _ if file.filename == "download" => "picture.jpg".to_string(),
        _ => file.filename,
    };
    Ok(Some(Picture {
        filename,
        bytes: file.bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_cat_url() {
        let payload = json!([{"id": "9j5", "url": "https://cdn2.thecatapi.com/images/9j5.jpg", "width": 640}]);
        assert_eq!(
            extract_url(PictureSource::Cat, &payload).as_deref(),
            Some("https://cdn2.thecatapi.com/images/9j5.jpg")
        );
        assert_eq!(extract_url(PictureSource::Cat, &json!([])), None);
    }

    #[test]
    fn test_extract_dog_url() {
        let payload = json!({"message": "https://images.dog.ceo/breeds/pug/n02110958_1975.jpg", "status": "success"});
        assert_eq!(
            extract_url(PictureSource::Dog, &payload).as_deref(),
            Some("https://images.dog.ceo/breeds/pug/n02110958_1975.jpg")
        );
        assert_eq!(extract_url(PictureSource::Dog, &json!({"status": "error"})), None);
    }

    #[test]
    fn test_extract_bread_url() {
        let payload = json!({"id": "x", "urls": {"full": "https://images.unsplash.com/photo-1?ixid=1", "raw": "r"}});
        assert_eq!(
            extract_url(PictureSource::Bread, &payload).as_deref(),
            Some("https://images.unsplash.com/photo-1?ixid=1")
        );
        assert_eq!(extract_url(PictureSource::Bread, &json!({"errors": ["Rate Limit Exceeded"]})), None);
    }

    #[test]
    fn test_empty_url_counts_as_missing() {
        assert_eq!(extract_url(PictureSource::Dog, &json!({"message": ""})), None);
    }

    #[test]
    fn test_messages_per_source() {
        assert_eq!(PictureSource::Bread.interface(), Interface::BreadApi);
        assert!(PictureSource::Dog.missing_message().contains("Blame my maintainer"));
    }
}
