pub mod file;
pub mod media;
pub mod metadata;

pub use file::{File, FileStatus};
pub use media::{FieldValue, FileReference, Media};
pub use metadata::{MetadataValue, SourceMetadata};
