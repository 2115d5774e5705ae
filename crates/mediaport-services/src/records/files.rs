use mediaport_core::bundles::BundleRegistry;
use mediaport_core::models::{File, Media};
use mediaport_core::AppError;
use mediaport_db::UnitOfWork;
use mediaport_storage::Location;
use std::sync::Arc;
use uuid::Uuid;

/// File Record Repository: creation, lookup and saves of File records.
#[derive(Clone)]
pub struct FileRecords {
    bundles: Arc<BundleRegistry>,
}

impl FileRecords {
    pub fn new(bundles: Arc<BundleRegistry>) -> Self {
        Self { bundles }
    }

    /// A new permanent File for `location`. Not persisted; the caller saves
    /// it once the content write has succeeded.
    pub fn create_file(
        &self,
        location: &Location,
        owner_id: Uuid,
        mime_type: &str,
        filename: &str,
    ) -> File {
        File::new_permanent(location.to_string(), owner_id, mime_type, filename)
    }

    /// The File referenced by the media's source field.
    pub async fn load_source_file(
        &self,
        uow: &mut dyn UnitOfWork,
        media: &Media,
    ) -> Result<File, AppError> {
        let bundle = self
            .bundles
            .bundle(&media.bundle)
            .ok_or_else(|| AppError::NotFound(format!("Bundle {} does not exist", media.bundle)))?;

        let source_field = bundle.source_field.as_deref().ok_or_else(|| {
            AppError::NotFound(format!("Source field not set for {} media", media.bundle))
        })?;

        let reference = media.file_reference(source_field).ok_or_else(|| {
            AppError::NotFound(format!(
                "Source field {} is empty on media {}",
                source_field, media.id
            ))
        })?;

        uow.find_file(reference.target_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "Source file {} of media {} not found",
                reference.target_id, media.id
            ))
        })
    }

    /// Persist a File created by [`FileRecords::create_file`].
    pub async fn save_new(&self, uow: &mut dyn UnitOfWork, file: &File) -> Result<File, AppError> {
        uow.insert_file(file).await
    }

    /// Persist changes to an existing File.
    pub async fn save(&self, uow: &mut dyn UnitOfWork, file: &File) -> Result<File, AppError> {
        uow.update_file(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaport_db::{Database, InMemoryDatabase};

    fn records() -> FileRecords {
        FileRecords::new(Arc::new(
            BundleRegistry::from_json_str(
                r#"{ "bundles": {
                    "image": {
                        "source_field": "field_media_image",
                        "fields": { "field_media_image": { "type": "image", "file_extensions": ["jpg"] } }
                    },
                    "remote_video": { "fields": {} }
                } }"#,
            )
            .unwrap(),
        ))
    }

    #[test]
    fn test_create_file_is_permanent_and_unsaved() {
        let location = Location::parse("public://x/y.jpg").unwrap();
        let owner = Uuid::new_v4();
        let file = records().create_file(&location, owner, "image/jpeg", "y.jpg");
        assert!(file.is_permanent());
        assert_eq!(file.location, "public://x/y.jpg");
        assert_eq!(file.owner_id, owner);
    }

    #[tokio::test]
    async fn test_load_source_file() {
        let db = InMemoryDatabase::new();
        let owner = Uuid::new_v4();
        let file = File::new_permanent("public://a.jpg", owner, "image/jpeg", "a.jpg");
        db.insert_file(file.clone()).await;
        let mut media = Media::new("image", owner);
        media.set_file("field_media_image", file.id);

        let mut uow = db.begin().await.unwrap();
        let loaded = records().load_source_file(uow.as_mut(), &media).await.unwrap();
        assert_eq!(loaded.id, file.id);
    }

    #[tokio::test]
    async fn test_load_source_file_not_found_cases() {
        let db = InMemoryDatabase::new();
        let owner = Uuid::new_v4();
        let records = records();
        let mut uow = db.begin().await.unwrap();

        let no_source = Media::new("remote_video", owner);
        let err = records.load_source_file(uow.as_mut(), &no_source).await.unwrap_err();
        assert!(
            matches!(err, AppError::NotFound(ref m) if m == "Source field not set for remote_video media")
        );

        let empty = Media::new("image", owner);
        let err = records.load_source_file(uow.as_mut(), &empty).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let mut dangling = Media::new("image", owner);
        dangling.set_file("field_media_image", Uuid::new_v4());
        let err = records.load_source_file(uow.as_mut(), &dangling).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let unknown = Media::new("audio", owner);
        let err = records.load_source_file(uow.as_mut(), &unknown).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Bundle audio does not exist"));
    }
}
