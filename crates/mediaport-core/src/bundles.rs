//! Typed bundle configuration.
//!
//! A bundle is the type designator of a media record. Its configuration names
//! the source field, the source plugin that reports metadata for the source
//! file, every field the bundle carries (with the extension policy of
//! file-typed fields) and the metadata-key to destination-field map.
//!
//! The registry is read once at startup and shared read-only afterwards.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    File,
    Image,
    String,
    Integer,
    Float,
}

impl FieldKind {
    pub fn holds_file(&self) -> bool {
        matches!(self, FieldKind::File | FieldKind::Image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Allowed filename extensions, lowercase without a leading dot.
    /// `""` admits filenames without an extension.
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,
}

fn default_source_plugin() -> String {
    "file".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleConfig {
    #[serde(default = "default_source_plugin")]
    pub source_plugin: String,
    #[serde(default)]
    pub source_field: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
    /// Source-plugin metadata key -> destination field.
    #[serde(default)]
    pub field_map: BTreeMap<String, String>,
}

impl BundleConfig {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.get(name)
    }

    /// Extension policy of a file-typed field. `None` when the field is
    /// unknown, not file-typed, or carries no policy.
    pub fn allowed_extensions(&self, name: &str) -> Option<&[String]> {
        self.fields
            .get(name)
            .filter(|f| f.kind.holds_file())
            .and_then(|f| f.file_extensions.as_deref())
            .filter(|exts| !exts.is_empty())
    }

    fn normalize(&mut self) {
        for field in self.fields.values_mut() {
            if let Some(exts) = field.file_extensions.as_mut() {
                for ext in exts.iter_mut() {
                    *ext = ext.trim().trim_start_matches('.').to_lowercase();
                }
                exts.sort();
                exts.dedup();
            }
        }
        self.source_plugin = self.source_plugin.trim().to_lowercase();
    }

    fn check(&self, bundle: &str) -> Result<(), anyhow::Error> {
        if let Some(source) = &self.source_field {
            match self.fields.get(source) {
                None => {
                    return Err(anyhow::anyhow!(
                        "Bundle {} declares source field {} which is not one of its fields",
                        bundle,
                        source
                    ))
                }
                Some(field) if !field.kind.holds_file() => {
                    return Err(anyhow::anyhow!(
                        "Bundle {} source field {} must be a file or image field",
                        bundle,
                        source
                    ))
                }
                Some(_) => {}
            }
        }
        for (name, field) in &self.fields {
            if field.kind.holds_file()
                && field
                    .file_extensions
                    .as_ref()
                    .map_or(true, |exts| exts.is_empty())
            {
                return Err(anyhow::anyhow!(
                    "File field {} on bundle {} must list allowed file_extensions",
                    name,
                    bundle
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BundleRegistry {
    #[serde(default)]
    bundles: BTreeMap<String, BundleConfig>,
}

impl BundleRegistry {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read bundle configuration {}: {}", path.display(), e)
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, anyhow::Error> {
        let mut registry: BundleRegistry = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Invalid bundle configuration: {}", e))?;
        for (name, bundle) in registry.bundles.iter_mut() {
            bundle.normalize();
            bundle.check(name)?;
        }
        Ok(registry)
    }

    pub fn bundle(&self, name: &str) -> Option<&BundleConfig> {
        self.bundles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BundleConfig)> {
        self.bundles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
