//! Public URLs for media and file resources.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v0";

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base_url: String,
    storage_public_url: String,
}

impl UrlBuilder {
    pub fn new(base_url: impl Into<String>, storage_public_url: impl Into<String>) -> Self {
        UrlBuilder {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage_public_url: storage_public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn media_canonical_url(&self, media_id: Uuid) -> String {
        format!("{}/media/{}", self.base_url, media_id)
    }

    /// REST representation of a media, optionally with `?_format=`.
    pub fn media_rest_url(&self, media_id: Uuid, format: Option<&str>) -> String {
        let url = format!("{}{}/media/{}", self.base_url, API_PREFIX, media_id);
        match format {
            Some(fmt) => format!("{}?_format={}", url, fmt),
            None => url,
        }
    }

    /// Path of the file resource, used for `Location` headers.
    pub fn file_resource_path(&self, file_id: Uuid) -> String {
        format!("{}/files/{}", API_PREFIX, file_id)
    }

    /// Download URL of a `scheme://path` location.
    pub fn file_download_url(&self, location: &str) -> String {
        let (scheme, path) = location.split_once("://").unwrap_or(("public", location));
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect();
        format!("{}/{}/{}", self.storage_public_url, scheme, encoded.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> UrlBuilder {
        UrlBuilder::new("https://repo.example.org/", "https://repo.example.org/files")
    }

    #[test]
    fn test_media_urls() {
        let id = Uuid::nil();
        let urls = builder();
        assert_eq!(
            urls.media_canonical_url(id),
            format!("https://repo.example.org/media/{}", id)
        );
        assert_eq!(
            urls.media_rest_url(id, Some("json")),
            format!("https://repo.example.org/api/v0/media/{}?_format=json", id)
        );
        assert_eq!(
            urls.media_rest_url(id, None),
            format!("https://repo.example.org/api/v0/media/{}", id)
        );
    }

    #[test]
    fn test_file_download_url_encodes_segments() {
        let urls = builder();
        assert_eq!(
            urls.file_download_url("public://2024-01/my photo#1.jpg"),
            "https://repo.example.org/files/public/2024-01/my%20photo%231.jpg"
        );
        assert_eq!(
            urls.file_resource_path(Uuid::nil()),
            format!("/api/v0/files/{}", Uuid::nil())
        );
    }
}
