use mediaport_core::AppError;
use std::path::Path;

/// Validation errors for incoming content
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file extension. Valid types are {}", .allowed.join(", "))]
    InvalidExtension {
        filename: String,
        allowed: Vec<String>,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Lowercased extension of `filename`, `""` when it has none.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Accept `filename` when its extension is one of `allowed` (case-insensitive).
///
/// A filename without an extension is accepted only when `""` is allowed.
/// An empty `allowed` set rejects everything.
pub fn validate_extension(filename: &str, allowed: &[String]) -> Result<(), ValidationError> {
    let extension = file_extension(filename);

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
        return Ok(());
    }

    tracing::debug!(filename = %filename, extension = %extension, "Rejected file extension");
    Err(ValidationError::InvalidExtension {
        filename: filename.to_string(),
        allowed: allowed
            .iter()
            .filter(|a| !a.is_empty())
            .cloned()
            .collect(),
    })
}
