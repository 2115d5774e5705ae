use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// A scalar metadata value reported by a source plugin or stored on a media field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MetadataValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            MetadataValue::Integer(v) => u32::try_from(*v).ok(),
            MetadataValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u32),
            _ => None,
        }
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Integer(v)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::Integer(i64::from(v))
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

/// Metadata a source plugin extracted from a file, keyed by attribute name
/// (`width`, `height`, `mimetype`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata {
    values: BTreeMap<String, MetadataValue>,
}

impl SourceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_u32() {
        assert_eq!(MetadataValue::Integer(640).as_u32(), Some(640));
        assert_eq!(MetadataValue::Integer(-1).as_u32(), None);
        assert_eq!(MetadataValue::Float(480.0).as_u32(), Some(480));
        assert_eq!(MetadataValue::Float(1.5).as_u32(), None);
        assert_eq!(MetadataValue::Text("640".into()).as_u32(), None);
    }

    #[test]
    fn test_untagged_serialization() {
        let values = vec![
            MetadataValue::Integer(3),
            MetadataValue::Float(2.5),
            MetadataValue::Text("image/png".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[3,2.5,"image/png"]"#);
        let back: Vec<MetadataValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
