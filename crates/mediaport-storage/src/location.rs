use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Component, Path};
use std::str::FromStr;

use crate::traits::StorageError;

/// A `scheme://path` address of stored content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    scheme: String,
    path: String,
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let raw = raw.trim();
        let (scheme, path) = raw.split_once("://").ok_or_else(|| {
            StorageError::InvalidLocation(format!("{} is not a scheme://path location", raw))
        })?;

        let scheme = scheme.to_lowercase();
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(StorageError::InvalidLocation(format!(
                "{} has an invalid scheme",
                raw
            )));
        }

        if path.is_empty() || path.ends_with('/') {
            return Err(StorageError::InvalidLocation(format!(
                "{} does not name a file",
                raw
            )));
        }
        if path.contains('\\') || path.contains('\0') {
            return Err(StorageError::InvalidLocation(format!(
                "{} contains invalid characters",
                raw
            )));
        }
        let traverses = Path::new(path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if traverses || path.starts_with('/') {
            return Err(StorageError::InvalidLocation(format!(
                "{} resolves outside its scheme root",
                raw
            )));
        }

        Ok(Location {
            scheme,
            path: path.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Path relative to the scheme root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

impl FromStr for Location {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::parse(s)
    }
}
