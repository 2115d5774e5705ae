pub mod file_get;
pub mod health;
pub mod media_get;
pub mod media_source;
