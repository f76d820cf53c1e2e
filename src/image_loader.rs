//! # Image Loading and Decoding
//!
//! Resolves overlay image references (background, watermark, seal,
//! signature, header and footer art) to decoded RGBA pixels.
//!
//! Resolution is the only step of a render that suspends. The rasterizer
//! awaits each reference in z-order before drawing the next layer. A
//! reference that cannot be fetched or decoded yields `None`: the layer is
//! omitted and the render carries on.
//!
//! Supported references:
//! - `data:image/...;base64,...` and plain `data:` URIs
//! - `http://` and `https://` URLs
//! - anything else is read as a file path

use async_trait::async_trait;
use base64::Engine;

use crate::error::AssetError;

/// A decoded image in straight (non-premultiplied) RGBA.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: image::RgbaImage,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Height when scaled to `width`, preserving aspect ratio.
    pub fn height_for_width(&self, width: f32) -> f32 {
        if self.width() == 0 {
            return 0.0;
        }
        width * self.height() as f32 / self.width() as f32
    }
}

/// Where image bytes come from. Implemented by the default network/disk
/// source and by in-memory sources in tests.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError>;
}

/// Data URIs, HTTP(S) and the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct DefaultAssetSource {
    client: reqwest::Client,
}

impl DefaultAssetSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetSource for DefaultAssetSource {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        if reference.starts_with("data:") {
            return decode_data_uri(reference);
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            let response = self.client.get(reference).send().await?.error_for_status()?;
            return Ok(response.bytes().await?.to_vec());
        }

        let path = match reference.split_once("://") {
            Some(("file", path)) => path,
            Some((scheme, _)) => return Err(AssetError::Unsupported(scheme.to_string())),
            None => reference,
        };
        tokio::fs::read(path).await.map_err(|source| AssetError::Io {
            path: path.to_string(),
            source,
        })
    }
}

/// Decode a `data:` URI payload.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUri("missing comma".to_string()))?;
    if header.ends_with(";base64") {
        // Tolerate line-wrapped base64
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Decode PNG, JPEG or WebP bytes into RGBA.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, AssetError> {
    let decoded = image::load_from_memory(data)?;
    Ok(LoadedImage {
        pixels: decoded.to_rgba8(),
    })
}

/// Fetches and decodes overlay images, degrading failures to `None`.
pub struct AssetLoader<'a> {
    source: &'a dyn AssetSource,
}

impl<'a> AssetLoader<'a> {
    pub fn new(source: &'a dyn AssetSource) -> Self {
        Self { source }
    }

    /// Resolve one reference. `role` names the overlay for logging.
    pub async fn load(&self, role: &str, reference: &str) -> Option<LoadedImage> {
        let reference = crate::model::image_ref(reference)?;
        let result = match self.source.fetch(reference).await {
            Ok(bytes) => decode_image_bytes(&bytes),
            Err(e) => Err(e),
        };
        match result {
            Ok(image) => {
                tracing::debug!(
                    role,
                    width = image.width(),
                    height = image.height(),
                    "resolved overlay image"
                );
                Some(image)
            }
            Err(e) => {
                tracing::warn!(
                    role,
                    reference = %truncate_reference(reference),
                    error = %e,
                    "omitting overlay layer"
                );
                None
            }
        }
    }
}

/// Data URIs can be megabytes long; keep log lines short.
fn truncate_reference(reference: &str) -> String {
    const MAX: usize = 64;
    if reference.chars().count() <= MAX {
        reference.to_string()
    } else {
        let head: String = reference.chars().take(MAX).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 0, 0, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    struct MapSource(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl AssetSource for MapSource {
        async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
            self.0
                .get(reference)
                .cloned()
                .ok_or_else(|| AssetError::InvalidDataUri(reference.to_string()))
        }
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(decode_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn test_decode_base64_data_uri() {
        let png = png_bytes(2, 3);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let bytes = decode_data_uri(&uri).unwrap();
        let loaded = decode_image_bytes(&bytes).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (2, 3));
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        assert!(decode_image_bytes(&[0x89, 0x50, 0x4E, 0x47, 0, 0]).is_err());
    }

    #[test]
    fn test_height_for_width() {
        let loaded = decode_image_bytes(&png_bytes(200, 50)).unwrap();
        assert_eq!(loaded.height_for_width(794.0), 198.5);
    }

    #[tokio::test]
    async fn test_loader_resolves_and_degrades() {
        let mut map = HashMap::new();
        map.insert("seal.png".to_string(), png_bytes(4, 4));
        map.insert("broken.png".to_string(), vec![1, 2, 3, 4, 5]);
        let source = MapSource(map);
        let loader = AssetLoader::new(&source);

        assert!(loader.load("seal", "seal.png").await.is_some());
        assert!(loader.load("seal", "broken.png").await.is_none());
        assert!(loader.load("seal", "missing.png").await.is_none());
        assert!(loader.load("seal", "   ").await.is_none());
    }

    #[tokio::test]
    async fn test_default_source_reads_missing_file_as_error() {
        let source = DefaultAssetSource::new();
        let err = source.fetch("/no/such/image.png").await.unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[tokio::test]
    async fn test_default_source_rejects_unknown_scheme() {
        let source = DefaultAssetSource::new();
        let err = source.fetch("ftp://example.com/seal.png").await.unwrap_err();
        assert!(matches!(err, AssetError::Unsupported(ref s) if s == "ftp"));
    }

    #[test]
    fn test_truncate_reference() {
        let long = "x".repeat(100);
        assert_eq!(truncate_reference(&long).chars().count(), 65);
        assert_eq!(truncate_reference("a.png"), "a.png");
    }
}
