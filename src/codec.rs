//! # Codec Adapter Module
//!
//! Questo modulo incapsula le primitive di decodifica/codifica raster.
//!
//! ## Responsabilità:
//! - `decode`: byte grezzi → `DecodedBitmap` (JPEG, PNG, GIF, WebP)
//! - `encode`: bitmap + dimensioni target + qualità → byte WebP
//! - `probe_format_support`: verifica che il backend sappia leggere WebP
//!
//! ## Backend
//!
//! | Operazione | Libreria | Note |
//! |------------|----------|------|
//! | Decode     | `image`  | fallback su libwebp per WebP non supportati |
//! | Resample   | `image::imageops` | filtro Triangle, solo se la dimensione cambia |
//! | Encode     | `webp` (libwebp) | lossy, method 4 (come `cwebp -m 4`) |
//!
//! ## Superficie di rasterizzazione
//!
//! Ogni chiamata a `encode` disegna la bitmap in un buffer RGBA di esattamente
//! `width x height` pixel. Il buffer appartiene alla chiamata e viene rilasciato
//! su ogni percorso di uscita, errori inclusi: nessuno stato globale.
//!
//! Il trait `Codec` è sincrono; è il chiamante a spostarlo su un thread
//! bloccante (vedi `image_processor`).

use crate::error::OptimizeError;
use crate::resize::ImageDimensions;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use tracing::debug;

/// Extension of the format every image is encoded to
pub const TARGET_EXTENSION: &str = "webp";

/// Largest width or height libwebp can encode
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Encoder effort, same trade-off as `cwebp -m 4`
const WEBP_METHOD: i32 = 4;

/// Smallest valid lossless WebP (1x1 pixel), used by the capability probe.
const WEBP_PROBE_SAMPLE: [u8; 34] = [
    0x52, 0x49, 0x46, 0x46, 0x1a, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
    0x4c, 0x0d, 0x00, 0x00, 0x00, 0x2f, 0x00, 0x00, 0x00, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88,
    0x88, 0xfe, 0x07, 0x00,
];

/// Decoded pixel data, ready to be drawn onto a surface
pub struct DecodedBitmap {
    image: DynamicImage,
}

impl DecodedBitmap {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Natural size of the decoded image.
    pub fn dimensions(&self) -> ImageDimensions {
        let (width, height) = self.image.dimensions();
        ImageDimensions::new(width, height)
    }

    /// Draws the bitmap onto a fresh RGBA surface of exactly `target` size.
    pub fn rasterize(&self, target: ImageDimensions) -> RgbaImage {
        if self.dimensions() == target {
            self.image.to_rgba8()
        } else {
            imageops::resize(&self.image, target.width, target.height, FilterType::Triangle)
        }
    }
}

/// Raster decode/encode primitive used by the transcoder
pub trait Codec: Send + Sync + 'static {
    /// Extension of the encoded output, without the dot.
    fn extension(&self) -> &'static str;

    /// Decodes any supported raster format.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedBitmap, OptimizeError>;

    /// Encodes `bitmap` at `target` size; `quality` is in `[0, 1]`.
    fn encode(
        &self,
        bitmap: &DecodedBitmap,
        target: ImageDimensions,
        quality: f32,
    ) -> Result<Vec<u8>, OptimizeError>;
}

/// Lossy WebP codec backed by `image` and libwebp
#[derive(Debug, Default, Clone, Copy)]
pub struct WebpCodec;

impl WebpCodec {
    pub fn new() -> Self {
        Self
    }

    /// Fallback for WebP files the `image` decoder rejects.
    fn decode_with_libwebp(bytes: &[u8]) -> Option<DynamicImage> {
        let decoded = webp::Decoder::new(bytes).decode()?;
        let (width, height) = (decoded.width(), decoded.height());
        let pixels = decoded.to_vec();
        if decoded.is_alpha() {
            RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
    }
}

impl Codec for WebpCodec {
    fn extension(&self) -> &'static str {
        TARGET_EXTENSION
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedBitmap, OptimizeError> {
        if bytes.is_empty() {
            return Err(OptimizeError::Decode("input is empty".to_string()));
        }

        match image::load_from_memory(bytes) {
            Ok(image) => Ok(DecodedBitmap::new(image)),
            Err(err) if is_webp(bytes) => {
                debug!("image crate rejected WebP input ({}), retrying with libwebp", err);
                Self::decode_with_libwebp(bytes)
                    .map(DecodedBitmap::new)
                    .ok_or_else(|| OptimizeError::Decode(err.to_string()))
            }
            Err(err) => Err(OptimizeError::Decode(err.to_string())),
        }
    }

    fn encode(
        &self,
        bitmap: &DecodedBitmap,
        target: ImageDimensions,
        quality: f32,
    ) -> Result<Vec<u8>, OptimizeError> {
        if !(0.0..=1.0).contains(&quality) {
            return Err(OptimizeError::Encode(format!(
                "quality {} is outside [0, 1]",
                quality
            )));
        }
        if target.area() == 0 {
            return Err(OptimizeError::Encode(format!(
                "cannot encode a zero-area surface ({})",
                target
            )));
        }
        if target.width > WEBP_MAX_DIMENSION || target.height > WEBP_MAX_DIMENSION {
            return Err(OptimizeError::Encode(format!(
                "{} exceeds the WebP limit of {} pixels per side",
                target, WEBP_MAX_DIMENSION
            )));
        }

        let surface = bitmap.rasterize(target);

        let mut config = webp::WebPConfig::new().map_err(|_| {
            OptimizeError::Encode("libwebp could not initialise an encoder config".to_string())
        })?;
        config.lossless = 0;
        config.quality = quality * 100.0;
        config.method = WEBP_METHOD;

        let encoded = webp::Encoder::from_rgba(surface.as_raw(), target.width, target.height)
            .encode_advanced(&config)
            .map_err(|e| OptimizeError::Encode(format!("libwebp lossy encode failed: {:?}", e)))?;

        Ok(encoded.to_vec())
    }
}

/// RIFF container with a WEBP form type.
fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

/// Checks whether WebP images can be decoded on this system.
///
/// Decodes a minimal known-valid WebP sample; the result is advisory only and
/// never gates processing.
pub fn probe_format_support() -> bool {
    let supported = webp::Decoder::new(&WEBP_PROBE_SAMPLE)
        .decode()
        .map(|image| image.width() > 0 && image.height() > 0)
        .unwrap_or(false);
    debug!("WebP capability probe: {}", supported);
    supported
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures and a scripted codec shared by the pipeline tests.

    use super::*;
    use image::ImageOutputFormat;
    use std::io::Cursor;

    /// PNG-encoded gradient of the given size.
    pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        encode_fixture(width, height, ImageOutputFormat::Png)
    }

    /// JPEG-encoded gradient of the given size.
    pub fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
        encode_fixture(width, height, ImageOutputFormat::Jpeg(90))
    }

    fn encode_fixture(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, format)
            .unwrap();
        buffer.into_inner()
    }

    /// Codec driven by the first byte of its input:
    /// `b'D'` fails decoding, `b'E'` fails encoding, anything else succeeds.
    /// Successful encodes return `encoded_len` bytes.
    pub struct ScriptedCodec {
        pub width: u32,
        pub height: u32,
        pub encoded_len: usize,
    }

    impl ScriptedCodec {
        pub fn new(width: u32, height: u32, encoded_len: usize) -> Self {
            Self {
                width,
                height,
                encoded_len,
            }
        }
    }

    impl Codec for ScriptedCodec {
        fn extension(&self) -> &'static str {
            TARGET_EXTENSION
        }

        fn decode(&self, bytes: &[u8]) -> Result<DecodedBitmap, OptimizeError> {
            match bytes.first().copied() {
                Some(b'D') | None => Err(OptimizeError::Decode("scripted decode failure".into())),
                Some(b'E') => Ok(DecodedBitmap::new(DynamicImage::new_rgba8(1, 1))),
                _ => Ok(DecodedBitmap::new(DynamicImage::new_rgba8(
                    self.width,
                    self.height,
                ))),
            }
        }

        fn encode(
            &self,
            bitmap: &DecodedBitmap,
            target: ImageDimensions,
            _quality: f32,
        ) -> Result<Vec<u8>, OptimizeError> {
            if bitmap.dimensions() == ImageDimensions::new(1, 1) {
                return Err(OptimizeError::Encode("scripted encode failure".into()));
            }
            assert!(target.area() > 0);
            Ok(vec![0u8; self.encoded_len])
        }
    }
}
