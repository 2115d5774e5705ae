use mediaport_core::bundles::{BundleConfig, BundleRegistry};
use mediaport_core::models::{File, Media};
use mediaport_core::AppError;
use mediaport_db::UnitOfWork;
use mediaport_processing::MetadataProviders;
use std::sync::Arc;

/// Media Record Repository: bundle lookups, metadata mapping and saves.
#[derive(Clone)]
pub struct MediaRecords {
    bundles: Arc<BundleRegistry>,
    providers: MetadataProviders,
}

impl MediaRecords {
    pub fn new(bundles: Arc<BundleRegistry>, providers: MetadataProviders) -> Self {
        Self { bundles, providers }
    }

    pub fn bundle(&self, name: &str) -> Result<&BundleConfig, AppError> {
        self.bundles
            .bundle(name)
            .ok_or_else(|| AppError::NotFound(format!("Bundle {} does not exist", name)))
    }

    /// Source field configured for `bundle`. An unknown bundle is an error; a
    /// bundle without a source field yields `None`.
    pub fn resolve_source_field_name(&self, bundle: &str) -> Result<Option<String>, AppError> {
        Ok(self.bundle(bundle)?.source_field.clone())
    }

    /// Copy metadata reported by the bundle's source plugin into the mapped
    /// media fields. Width and height are also written onto the source
    /// field's own file reference.
    #[tracing::instrument(skip(self, media, file), fields(media.id = %media.id, file.id = %file.id))]
    pub async fn apply_field_mapping(&self, media: &mut Media, file: &File) -> Result<(), AppError> {
        let bundle = self.bundle(&media.bundle)?;
        let provider = self.providers.get(&bundle.source_plugin).ok_or_else(|| {
            AppError::Internal(format!(
                "Source plugin {} for bundle {} is not registered",
                bundle.source_plugin, media.bundle
            ))
        })?;

        let metadata = provider.extract(media, file).await?;

        for (key, destination) in &bundle.field_map {
            let Some(field) = bundle.field(destination) else {
                tracing::debug!(
                    metadata_key = %key,
                    field = %destination,
                    bundle = %media.bundle,
                    "Mapped field does not exist on bundle; skipping"
                );
                continue;
            };
            if field.kind.holds_file() {
                continue;
            }
            if let Some(value) = metadata.get(key) {
                media.set_scalar(destination.clone(), value.clone());
            }
        }

        if let Some(source_field) = bundle.source_field.as_deref() {
            if let Some(reference) = media.file_reference_mut(source_field) {
                reference.width = metadata.get("width").and_then(|v| v.as_u32());
                reference.height = metadata.get("height").and_then(|v| v.as_u32());
            }
        }

        Ok(())
    }

    /// Persist `media`; returns the stored record with its new revision.
    pub async fn save(&self, uow: &mut dyn UnitOfWork, media: &Media) -> Result<Media, AppError> {
        uow.update_media(media).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mediaport_core::hooks::MetadataProvider;
    use mediaport_core::models::{MetadataValue, SourceMetadata};
    use uuid::Uuid;

    struct FixedProvider(SourceMetadata);

    #[async_trait]
    impl MetadataProvider for FixedProvider {
        fn id(&self) -> &'static str {
            "image"
        }

        async fn extract(&self, _media: &Media, _file: &File) -> Result<SourceMetadata, AppError> {
            Ok(self.0.clone())
        }
    }

    fn registry() -> Arc<BundleRegistry> {
        Arc::new(
            BundleRegistry::from_json_str(
                r#"{ "bundles": {
                    "image": {
                        "source_plugin": "image",
                        "source_field": "field_media_image",
                        "fields": {
                            "field_media_image": { "type": "image", "file_extensions": ["jpg", "png"] },
                            "field_width": { "type": "integer" },
                            "field_height": { "type": "integer" }
                        },
                        "field_map": { "width": "field_width", "height": "field_height", "mimetype": "field_gone" }
                    },
                    "folder": { "fields": {} }
                } }"#,
            )
            .unwrap(),
        )
    }

    fn records(metadata: SourceMetadata) -> MediaRecords {
        let mut providers = MetadataProviders::new();
        providers.register(Arc::new(FixedProvider(metadata)));
        MediaRecords::new(registry(), providers)
    }

    #[test]
    fn test_resolve_source_field_name() {
        let records = records(SourceMetadata::new());
        assert_eq!(
            records.resolve_source_field_name("image").unwrap().as_deref(),
            Some("field_media_image")
        );
        assert_eq!(records.resolve_source_field_name("folder").unwrap(), None);

        let err = records.resolve_source_field_name("audio").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Bundle audio does not exist"));
    }

    #[tokio::test]
    async fn test_apply_field_mapping_updates_fields_and_reference() {
        let records = records(
            SourceMetadata::new()
                .with("width", 640u32)
                .with("height", 480u32)
                .with("mimetype", "image/jpeg"),
        );
        let owner = Uuid::new_v4();
        let file = File::new_permanent("public://a.jpg", owner, "image/jpeg", "a.jpg");
        let mut media = Media::new("image", owner);
        media.set_file("field_media_image", file.id);

        records.apply_field_mapping(&mut media, &file).await.unwrap();

        assert_eq!(media.scalar("field_width"), Some(&MetadataValue::Integer(640)));
        assert_eq!(media.scalar("field_height"), Some(&MetadataValue::Integer(480)));
        assert!(media.field("field_gone").is_none());
        let reference = media.file_reference("field_media_image").unwrap();
        assert_eq!((reference.width, reference.height), (Some(640), Some(480)));
    }

    #[tokio::test]
    async fn test_apply_field_mapping_is_idempotent() {
        let records = records(SourceMetadata::new().with("width", 10u32).with("height", 20u32));
        let owner = Uuid::new_v4();
        let file = File::new_permanent("public://a.png", owner, "image/png", "a.png");
        let mut media = Media::new("image", owner);
        media.set_file("field_media_image", file.id);

        records.apply_field_mapping(&mut media, &file).await.unwrap();
        let first = media.fields.clone();
        records.apply_field_mapping(&mut media, &file).await.unwrap();
        assert_eq!(media.fields, first);
    }

    #[tokio::test]
    async fn test_unregistered_plugin_is_internal_error() {
        let records = MediaRecords::new(registry(), MetadataProviders::new());
        let owner = Uuid::new_v4();
        let file = File::new_permanent("public://a.png", owner, "image/png", "a.png");
        let mut media = Media::new("image", owner);

        let err = records.apply_field_mapping(&mut media, &file).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
