//! ActivityStreams 2.0 notifications for saved media.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediaport_core::{AppError, MediaEvent, MediaEventListener, UrlBuilder};
use serde::{Deserialize, Serialize};

use crate::broker::BrokerClient;

const AS2_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub href: String,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub rel: String,
}

impl Link {
    fn new(name: &str, href: String, media_type: &str, rel: &str) -> Self {
        Link {
            name: name.to_string(),
            kind: "Link".to_string(),
            href,
            media_type: media_type.to_string(),
            rel: rel.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityActor {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub url: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub actor: ActivityActor,
    pub object: ActivityObject,
    pub attachment: ActivityAttachment,
}

/// `Update` activity describing `event`.
pub fn update_activity(event: &MediaEvent, urls: &UrlBuilder) -> Activity {
    let media = &event.media;
    let file = &event.file;
    let download_url = urls.file_download_url(&file.location);

    Activity {
        context: AS2_CONTEXT.to_string(),
        kind: "Update".to_string(),
        summary: format!("Update {} media {}", media.bundle, media.id),
        published: media.updated_at,
        actor: ActivityActor {
            kind: "Person".to_string(),
            id: format!("urn:uuid:{}", event.actor.user_id),
        },
        object: ActivityObject {
            id: urls.media_canonical_url(media.id),
            kind: "Document".to_string(),
            name: file.filename.clone(),
            url: vec![
                Link::new(
                    "Canonical",
                    urls.media_canonical_url(media.id),
                    "text/html",
                    "canonical",
                ),
                Link::new(
                    "JSON",
                    urls.media_rest_url(media.id, Some("json")),
                    "application/json",
                    "alternate",
                ),
                Link::new("Source", download_url.clone(), &file.mime_type, "describedby"),
            ],
        },
        attachment: ActivityAttachment {
            kind: "Link".to_string(),
            media_type: file.mime_type.clone(),
            url: download_url,
        },
    }
}

/// Publishes an `Update` activity to the broker queue for every saved media.
pub struct BrokerEventListener {
    client: Arc<BrokerClient>,
    urls: UrlBuilder,
    queue: String,
}

impl BrokerEventListener {
    pub fn new(client: Arc<BrokerClient>, urls: UrlBuilder, queue: impl Into<String>) -> Self {
        Self {
            client,
            urls,
            queue: queue.into(),
        }
    }
}

#[async_trait]
impl MediaEventListener for BrokerEventListener {
    #[tracing::instrument(skip(self, event), fields(media.id = %event.media.id, queue = %self.queue))]
    async fn media_saved(&self, event: MediaEvent) -> Result<(), AppError> {
        let activity = update_activity(&event, &self.urls);
        let body = serde_json::to_vec(&activity)?;
        self.client
            .send(&self.queue, "application/json", &body)
            .await?;

        tracing::info!(media.id = %event.media.id, "Published media update");
        Ok(())
    }
}
