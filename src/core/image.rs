//! Image Preprocessing
//!
//! Prepares captured photos for upload to vision providers: bounded-width
//! downscale, JPEG recompression, and base64 transport encoding.
//! Providers receive a compact payload instead of a full-resolution capture.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::PathBuf;

use super::{CoreError, CoreResult};

// =============================================================================
// Image Source
// =============================================================================

/// Reference to a captured image: a file on disk or an in-memory buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Local file path handed over by the capture/pick UI
    Path(PathBuf),
    /// Raw encoded image bytes (any format the `image` crate can decode)
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Creates a source from a file path
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a source from raw bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

// =============================================================================
// Image Options
// =============================================================================

/// Resize/quality parameters applied before upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    /// Maximum output width in pixels; larger images are downscaled,
    /// smaller images are never upscaled
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// JPEG recompression quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_width() -> u32 {
    800
}

fn default_jpeg_quality() -> u8 {
    70
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

// =============================================================================
// Encoded Image
// =============================================================================

/// A preprocessed image ready for transport
#[derive(Clone, Debug)]
pub struct EncodedImage {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Recompressed JPEG bytes
    pub jpeg: Vec<u8>,
}

impl EncodedImage {
    /// MIME type of the encoded payload
    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    /// Returns the payload as a base64 string
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.jpeg)
    }

    /// Returns the payload as a `data:` URL (OpenAI-style image transport)
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

// =============================================================================
// Preprocessing
// =============================================================================

/// Loads, downscales, and recompresses an image for upload.
///
/// Deterministic given the same input and options.
pub fn prepare_image(source: &ImageSource, options: &ImageOptions) -> CoreResult<EncodedImage> {
    let decoded = load_image(source)?;
    let resized = downscale(decoded, options.max_width);

    // JPEG has no alpha channel; normalize before encoding.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), options.jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CoreError::ImageProcessingFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(EncodedImage {
        width,
        height,
        jpeg,
    })
}

fn load_image(source: &ImageSource) -> CoreResult<DynamicImage> {
    match source {
        ImageSource::Path(path) => image::ImageReader::open(path)
            .map_err(|e| {
                CoreError::ImageProcessingFailed(format!(
                    "Failed to open {}: {}",
                    path.display(),
                    e
                ))
            })?
            .with_guessed_format()
            .map_err(|e| CoreError::ImageProcessingFailed(format!("Unknown image format: {}", e)))?
            .decode()
            .map_err(|e| CoreError::ImageProcessingFailed(format!("Failed to decode image: {}", e))),
        ImageSource::Bytes(bytes) => image::load_from_memory(bytes)
            .map_err(|e| CoreError::ImageProcessingFailed(format!("Failed to decode image: {}", e))),
    }
}

fn downscale(img: DynamicImage, max_width: u32) -> DynamicImage {
    if img.width() <= max_width {
        return img;
    }
    let height = ((u64::from(img.height()) * u64::from(max_width)) / u64::from(img.width())) as u32;
    img.resize(max_width, height.max(1), FilterType::Lanczos3)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    // -------------------------------------------------------------------------
    // Options Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_options() {
        let options = ImageOptions::default();
        assert_eq!(options.max_width, 800);
        assert_eq!(options.jpeg_quality, 70);
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: ImageOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ImageOptions::default());
    }

    // -------------------------------------------------------------------------
    // Preprocessing Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_prepare_downscales_wide_image() {
        let source = ImageSource::bytes(png_fixture(1600, 800));
        let encoded = prepare_image(&source, &ImageOptions::default()).unwrap();

        assert_eq!(encoded.width, 800);
        assert_eq!(encoded.height, 400);
        assert!(!encoded.jpeg.is_empty());
    }

    #[test]
    fn test_prepare_keeps_small_image_size() {
        let source = ImageSource::bytes(png_fixture(320, 240));
        let encoded = prepare_image(&source, &ImageOptions::default()).unwrap();

        assert_eq!(encoded.width, 320);
        assert_eq!(encoded.height, 240);
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let source = ImageSource::bytes(png_fixture(1024, 768));
        let options = ImageOptions::default();

        let first = prepare_image(&source, &options).unwrap();
        let second = prepare_image(&source, &options).unwrap();

        assert_eq!(first.jpeg, second.jpeg);
    }

    #[test]
    fn test_prepare_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shoe.png");
        std::fs::write(&path, png_fixture(640, 480)).unwrap();

        let encoded = prepare_image(&ImageSource::path(&path), &ImageOptions::default()).unwrap();
        assert_eq!(encoded.width, 640);
    }

    #[test]
    fn test_prepare_rejects_garbage_bytes() {
        let source = ImageSource::bytes(vec![0u8; 64]);
        let result = prepare_image(&source, &ImageOptions::default());

        assert!(matches!(result, Err(CoreError::ImageProcessingFailed(_))));
    }

    #[test]
    fn test_prepare_missing_file() {
        let source = ImageSource::path("/nonexistent/shoe.jpg");
        let result = prepare_image(&source, &ImageOptions::default());

        assert!(matches!(result, Err(CoreError::ImageProcessingFailed(_))));
    }

    // -------------------------------------------------------------------------
    // Encoding Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_base64_round_trip() {
        let source = ImageSource::bytes(png_fixture(64, 64));
        let encoded = prepare_image(&source, &ImageOptions::default()).unwrap();

        let decoded = BASE64.decode(encoded.to_base64()).unwrap();
        assert_eq!(decoded, encoded.jpeg);
    }

    #[test]
    fn test_data_url_prefix() {
        let source = ImageSource::bytes(png_fixture(64, 64));
        let encoded = prepare_image(&source, &ImageOptions::default()).unwrap();

        assert!(encoded.to_data_url().starts_with("data:image/jpeg;base64,"));
    }
}
