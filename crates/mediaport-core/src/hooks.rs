//! Collaborator traits
//!
//! The ingestion core talks to its collaborators (metadata extraction,
//! authorization, post-commit notification) only through these traits so
//! hosts can swap implementations without touching the pipeline.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{File, Media, SourceMetadata};

/// Authenticated caller of an ingestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Actor {
            user_id,
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Source plugin: reports metadata (width, height, mimetype, ...) for the
/// file attached to a media's source field.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Plugin id referenced by `BundleConfig::source_plugin`.
    fn id(&self) -> &'static str;

    async fn extract(&self, media: &Media, file: &File) -> Result<SourceMetadata, AppError>;
}

/// Decides whether an actor may update a media record.
pub trait AccessPolicy: Send + Sync {
    fn can_update(&self, actor: &Actor, media: &Media) -> bool;
}

/// Owners may update their media; so may any actor holding a privileged role.
#[derive(Debug, Clone, Default)]
pub struct OwnerOrRoleAccessPolicy {
    privileged_roles: Vec<String>,
}

impl OwnerOrRoleAccessPolicy {
    pub fn new(privileged_roles: Vec<String>) -> Self {
        Self { privileged_roles }
    }
}

impl AccessPolicy for OwnerOrRoleAccessPolicy {
    fn can_update(&self, actor: &Actor, media: &Media) -> bool {
        actor.user_id == media.owner_id
            || self.privileged_roles.iter().any(|role| actor.has_role(role))
    }
}

/// Committed media save, handed to listeners after the transaction commits.
#[derive(Debug, Clone)]
pub struct MediaEvent {
    pub media: Media,
    /// The file that was written during the ingestion.
    pub file: File,
    pub actor: Actor,
}

/// Observer of committed media saves (derivative generation, indexing, ...).
#[async_trait]
pub trait MediaEventListener: Send + Sync {
    async fn media_saved(&self, event: MediaEvent) -> Result<(), AppError>;
}

/// No-op implementation for when no downstream actions are configured
pub struct NoOpMediaEventListener;

#[async_trait]
impl MediaEventListener for NoOpMediaEventListener {
    async fn media_saved(&self, _event: MediaEvent) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_may_update() {
        let owner = Uuid::new_v4();
        let media = Media::new("image", owner);
        let policy = OwnerOrRoleAccessPolicy::new(vec!["administrator".into()]);

        assert!(policy.can_update(&Actor::new(owner), &media));
        assert!(!policy.can_update(&Actor::new(Uuid::new_v4()), &media));
    }

    #[test]
    fn test_privileged_role_may_update() {
        let media = Media::new("image", Uuid::new_v4());
        let policy = OwnerOrRoleAccessPolicy::new(vec!["administrator".into()]);
        let admin = Actor::new(Uuid::new_v4()).with_role("Administrator");
        let editor = Actor::new(Uuid::new_v4()).with_role("editor");

        assert!(policy.can_update(&admin, &media));
        assert!(!policy.can_update(&editor, &media));
    }

    #[tokio::test]
    async fn test_noop_listener() {
        let owner = Uuid::new_v4();
        let event = MediaEvent {
            media: Media::new("image", owner),
            file: File::new_permanent("public://a.jpg", owner, "image/jpeg", "a.jpg"),
            actor: Actor::new(owner),
        };
        assert!(NoOpMediaEventListener.media_saved(event).await.is_ok());
    }
}
