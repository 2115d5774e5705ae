use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::metadata::MetadataValue;

/// Value stored on a file-typed media field.
///
/// `width`/`height` mirror the decoded dimensions of the referenced file so
/// image scaling never works from stale sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileReference {
    pub target_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl FileReference {
    pub fn new(target_id: Uuid) -> Self {
        FileReference {
            target_id,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    File(FileReference),
    Scalar(MetadataValue),
}

/// Logical content record. Fields absent from `fields` are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Media {
    pub id: Uuid,
    pub bundle: String,
    pub owner_id: Uuid,
    pub fields: BTreeMap<String, FieldValue>,
    /// Incremented on every save.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    pub fn new(bundle: impl Into<String>, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Media {
            id: Uuid::new_v4(),
            bundle: bundle.into(),
            owner_id,
            fields: BTreeMap::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// The file reference stored on `name`, if that field holds one.
    pub fn file_reference(&self, name: &str) -> Option<&FileReference> {
        match self.fields.get(name) {
            Some(FieldValue::File(reference)) => Some(reference),
            _ => None,
        }
    }

    pub fn file_reference_mut(&mut self, name: &str) -> Option<&mut FileReference> {
        match self.fields.get_mut(name) {
            Some(FieldValue::File(reference)) => Some(reference),
            _ => None,
        }
    }

    /// Point `name` at `file_id`, dropping dimensions recorded for the previous file.
    pub fn set_file(&mut self, name: impl Into<String>, file_id: Uuid) {
        self.fields
            .insert(name.into(), FieldValue::File(FileReference::new(file_id)));
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: MetadataValue) {
        self.fields.insert(name.into(), FieldValue::Scalar(value));
    }

    pub fn scalar(&self, name: &str) -> Option<&MetadataValue> {
        match self.fields.get(name) {
            Some(FieldValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_file_resets_dimensions() {
        let mut media = Media::new("image", Uuid::new_v4());
        let first = Uuid::new_v4();
        media.set_file("field_media_image", first);
        if let Some(reference) = media.file_reference_mut("field_media_image") {
            reference.width = Some(100);
            reference.height = Some(50);
        }

        let second = Uuid::new_v4();
        media.set_file("field_media_image", second);
        let reference = media.file_reference("field_media_image").unwrap();
        assert_eq!(reference.target_id, second);
        assert_eq!(reference.width, None);
    }

    #[test]
    fn test_scalar_is_not_a_file_reference() {
        let mut media = Media::new("image", Uuid::new_v4());
        media.set_scalar("field_width", MetadataValue::Integer(10));
        assert!(media.file_reference("field_width").is_none());
        assert_eq!(
            media.scalar("field_width"),
            Some(&MetadataValue::Integer(10))
        );
    }

    #[test]
    fn test_field_value_json_shape() {
        let id = Uuid::nil();
        let mut media = Media::new("image", Uuid::nil());
        media.set_file("field_media_image", id);
        media.set_scalar("field_mime", "image/png".into());

        let json = serde_json::to_value(&media.fields).unwrap();
        assert_eq!(json["field_media_image"]["kind"], "file");
        assert_eq!(
            json["field_media_image"]["value"]["target_id"],
            id.to_string()
        );
        assert_eq!(json["field_mime"]["kind"], "scalar");
        assert_eq!(json["field_mime"]["value"], "image/png");

        let back: BTreeMap<String, FieldValue> = serde_json::from_value(json).unwrap();
        assert_eq!(back, media.fields);
    }
}
