use std::io::Cursor;

pub const BUNDLES: &str = r#"{ "bundles": {
    "image": {
        "source_plugin": "image",
        "source_field": "field_media_image",
        "fields": {
            "field_media_image": { "type": "image", "file_extensions": ["jpg", "png"] },
            "field_width": { "type": "integer" },
            "field_height": { "type": "integer" },
            "field_mime_type": { "type": "string" }
        },
        "field_map": { "width": "field_width", "height": "field_height", "mimetype": "field_mime_type" }
    },
    "remote_video": {
        "source_plugin": "file",
        "fields": {
            "field_media_oembed_video": { "type": "string" },
            "field_media_thumbnail": { "type": "image", "file_extensions": ["jpg", "png"] }
        }
    }
} }"#;

/// Solid-colour PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 120, 220]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

/// `len` bytes starting with a JPEG marker. The body is not a decodable image.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len, 0x42);
    data
}
