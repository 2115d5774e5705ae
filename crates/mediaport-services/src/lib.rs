//! Mediaport Services
//!
//! The ingestion pipeline: file and media record repositories composed into
//! the attach-new and replace-source operations.

pub mod ingestion;
pub mod records;

pub use ingestion::{AttachRequest, Ingested, IngestionService, ReplaceRequest};
pub use records::{FileRecords, MediaRecords};
