//! Source plugins
//!
//! A bundle names the source plugin that describes its source file. The
//! plugin reads the stored bytes and reports metadata under well-known keys:
//!
//! | key        | plugin        | value                     |
//! |------------|---------------|---------------------------|
//! | `mimetype` | file, image   | MIME type of the File     |
//! | `filesize` | file, image   | bytes recorded on the File|
//! | `name`     | file, image   | filename                  |
//! | `width`    | image         | decoded pixel width       |
//! | `height`   | image         | decoded pixel height      |

use async_trait::async_trait;
use mediaport_core::hooks::MetadataProvider;
use mediaport_core::models::{File, Media, SourceMetadata};
use mediaport_core::AppError;
use mediaport_storage::ContentStore;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

fn file_metadata(file: &File) -> SourceMetadata {
    let mut metadata = SourceMetadata::new()
        .with("mimetype", file.mime_type.as_str())
        .with("name", file.filename.as_str());
    if let Some(size) = file.size {
        metadata.insert("filesize", size);
    }
    metadata
}

/// Reports attributes recorded on the File itself.
pub struct FileMetadataProvider;

#[async_trait]
impl MetadataProvider for FileMetadataProvider {
    fn id(&self) -> &'static str {
        "file"
    }

    async fn extract(&self, _media: &Media, file: &File) -> Result<SourceMetadata, AppError> {
        Ok(file_metadata(file))
    }
}

/// Bytes read from the start of an image when probing its dimensions. Large
/// enough to cover JPEG files with embedded EXIF thumbnails.
pub const IMAGE_HEADER_LIMIT: usize = 256 * 1024;

/// File attributes plus decoded image dimensions.
pub struct ImageMetadataProvider {
    store: Arc<dyn ContentStore>,
    header_limit: usize,
}

impl ImageMetadataProvider {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            header_limit: IMAGE_HEADER_LIMIT,
        }
    }

    pub fn with_header_limit(mut self, limit: usize) -> Self {
        self.header_limit = limit;
        self
    }
}

/// Width and height from the image header, `None` when the bytes are not a
/// decodable image. `data` may be a prefix of the file.
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[async_trait]
impl MetadataProvider for ImageMetadataProvider {
    fn id(&self) -> &'static str {
        "image"
    }

    #[tracing::instrument(skip(self, media, file), fields(media.id = %media.id, file.id = %file.id))]
    async fn extract(&self, media: &Media, file: &File) -> Result<SourceMetadata, AppError> {
        let mut metadata = file_metadata(file);

        let location = self.store.resolve(&file.location)?;
        let data = self.store.read_head(&location, self.header_limit).await?;

        match image_dimensions(&data) {
            Some((width, height)) => {
                metadata.insert("width", width);
                metadata.insert("height", height);
            }
            None => {
                tracing::warn!(
                    location = %file.location,
                    "Could not decode image dimensions"
                );
            }
        }

        Ok(metadata)
    }
}

/// Source plugins keyed by id.
#[derive(Clone, Default)]
pub struct MetadataProviders {
    providers: HashMap<&'static str, Arc<dyn MetadataProvider>>,
}

impl MetadataProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in `file` and `image` plugins.
    pub fn with_defaults(store: Arc<dyn ContentStore>) -> Self {
        let mut providers = Self::new();
        providers.register(Arc::new(FileMetadataProvider));
        providers.register(Arc::new(ImageMetadataProvider::new(store)));
        providers
    }

    pub fn register(&mut self, provider: Arc<dyn MetadataProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MetadataProvider>> {
        self.providers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaport_core::models::MetadataValue;
    use mediaport_storage::LocalStorage;
    use std::collections::BTreeMap;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    async fn store_with(path: &str, data: &[u8], dir: &std::path::Path) -> Arc<dyn ContentStore> {
        let mut roots = BTreeMap::new();
        roots.insert("public".to_string(), dir.to_path_buf());
        let store = LocalStorage::new(roots).await.unwrap();
        let location = store.resolve(path).unwrap();
        store.prepare_directory(&location).await.unwrap();
        let reader: mediaport_storage::ByteReader = Box::pin(Cursor::new(data.to_vec()));
        store.write_stream(&location, reader).await.unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_image_dimensions() {
        assert_eq!(image_dimensions(&png_bytes(7, 3)), Some((7, 3)));
        assert_eq!(image_dimensions(b"definitely not an image"), None);
    }

    #[tokio::test]
    async fn test_image_provider_reports_dimensions() {
        let dir = tempdir().unwrap();
        let data = png_bytes(32, 16);
        let store = store_with("public://img/a.png", &data, dir.path()).await;
        let provider = ImageMetadataProvider::new(store);

        let owner = Uuid::new_v4();
        let mut file = File::new_permanent("public://img/a.png", owner, "image/png", "a.png");
        file.size = Some(data.len() as i64);
        let media = Media::new("image", owner);

        let metadata = provider.extract(&media, &file).await.unwrap();
        assert_eq!(metadata.get("width").and_then(|v| v.as_u32()), Some(32));
        assert_eq!(metadata.get("height").and_then(|v| v.as_u32()), Some(16));
        assert_eq!(metadata.get("mimetype"), Some(&MetadataValue::from("image/png")));
        assert_eq!(
            metadata.get("filesize"),
            Some(&MetadataValue::from(data.len() as i64))
        );
    }

    #[tokio::test]
    async fn test_image_provider_reads_only_the_header() {
        let dir = tempdir().unwrap();
        let img = image::RgbImage::from_fn(400, 300, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        let data = out.into_inner();
        assert!(data.len() > 4096);

        let store = store_with("public://big.png", &data, dir.path()).await;
        let provider = ImageMetadataProvider::new(store).with_header_limit(128);
        let owner = Uuid::new_v4();
        let file = File::new_permanent("public://big.png", owner, "image/png", "big.png");

        let metadata = provider
            .extract(&Media::new("image", owner), &file)
            .await
            .unwrap();
        assert_eq!(metadata.get("width").and_then(|v| v.as_u32()), Some(400));
        assert_eq!(metadata.get("height").and_then(|v| v.as_u32()), Some(300));
    }

    #[tokio::test]
    async fn test_image_provider_tolerates_undecodable_bytes() {
        let dir = tempdir().unwrap();
        let store = store_with("public://a.jpg", b"garbage", dir.path()).await;
        let provider = ImageMetadataProvider::new(store);
        let owner = Uuid::new_v4();
        let file = File::new_permanent("public://a.jpg", owner, "image/jpeg", "a.jpg");

        let metadata = provider
            .extract(&Media::new("image", owner), &file)
            .await
            .unwrap();
        assert!(metadata.get("width").is_none());
        assert_eq!(metadata.get("name"), Some(&MetadataValue::from("a.jpg")));
    }

    #[tokio::test]
    async fn test_registry_defaults() {
        let dir = tempdir().unwrap();
        let store = store_with("public://x.txt", b"x", dir.path()).await;
        let providers = MetadataProviders::with_defaults(store);
        assert!(providers.contains("file"));
        assert!(providers.contains("image"));
        assert!(providers.get("video").is_none());
    }
}
