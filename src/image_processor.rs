//! # Image Processing Module
//!
//! Questo modulo gestisce l'ottimizzazione di una singola immagine: è l'unità di
//! lavoro che il batch optimizer invoca per ogni input.
//!
//! ## Pipeline di Ottimizzazione
//!
//! 1. **Decode**: byte originali → bitmap (thread bloccante, awaited)
//! 2. **Constrain**: dimensioni naturali → dimensioni entro i limiti (`resize`)
//! 3. **Encode**: bitmap → WebP alla qualità `quality / 100` (thread bloccante, awaited)
//! 4. **Naming**: estensione originale sostituita con `.webp`
//! 5. **Statistiche**: `compression_rate` arrotondato a due decimali
//!
//! ## Error Handling
//!
//! `transcode` non fallisce mai: ogni errore di decode, encode o timeout
//! diventa un `TranscodeOutcome::Failure` con un messaggio leggibile, così una
//! immagine corrotta non interrompe le altre. Nessun retry.
//!
//! ## Concorrenza
//!
//! Decode ed encode sono gli unici punti di sospensione: girano su
//! `tokio::task::spawn_blocking` e vengono attesi fino al completamento prima
//! di proseguire. La bitmap decodificata viene spostata nel task di encode e
//! rilasciata appena l'encode termina.
//!
//! Con `unit_timeout` decode ed encode condividono una sola deadline. Se scade,
//! l'esito è `Timeout`, ma il task bloccante viene comunque atteso: due unità
//! non sono mai in volo contemporaneamente.
//!
//! ## Esempio
//!
//! ```ignore
//! let processor = ImageProcessor::new(&Config::default());
//! let asset = ImageAsset::new("photo.jpg", std::fs::read("photo.jpg")?);
//! match processor.transcode(&asset, 80).await {
//!     TranscodeOutcome::Success { optimized, compression_rate, .. } => { /* ... */ }
//!     TranscodeOutcome::Failure { message, .. } => { /* ... */ }
//! }
//! ```

use crate::asset::ImageAsset;
use crate::codec::{Codec, WebpCodec};
use crate::config::Config;
use crate::error::OptimizeError;
use crate::outcome::TranscodeOutcome;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Transcodes single images with a shared codec
pub struct ImageProcessor<C: Codec = WebpCodec> {
    codec: Arc<C>,
    max_width: u32,
    max_height: u32,
    unit_timeout: Option<Duration>,
}

impl ImageProcessor<WebpCodec> {
    /// Creates a processor using the WebP codec.
    pub fn new(config: &Config) -> Self {
        Self::with_codec(config, WebpCodec::new())
    }
}

impl<C: Codec> ImageProcessor<C> {
    /// Creates a processor using any codec implementation.
    pub fn with_codec(config: &Config, codec: C) -> Self {
        Self {
            codec: Arc::new(codec),
            max_width: config.max_width,
            max_height: config.max_height,
            unit_timeout: config.unit_timeout,
        }
    }

    /// Transcodes one image. Never fails: errors become `TranscodeOutcome::Failure`.
    ///
    /// `quality` is on the 0-100 scale; values above 100 are clamped. With a
    /// unit timeout, the deadline decides the outcome but the call still
    /// returns only after its codec work has stopped.
    pub async fn transcode(&self, asset: &ImageAsset, quality: u8) -> TranscodeOutcome {
        let start_time = Instant::now();

        match self.try_transcode(asset, quality).await {
            Ok(outcome) => {
                debug!(
                    "Optimized {} in {:?}",
                    asset.name(),
                    start_time.elapsed()
                );
                outcome
            }
            Err(e) => {
                warn!(
                    "Failed to optimize {} after {:?}: {}",
                    asset.name(),
                    start_time.elapsed(),
                    e
                );
                TranscodeOutcome::Failure {
                    original_name: asset.name().to_string(),
                    original_size: asset.byte_size(),
                    message: e.to_string(),
                }
            }
        }
    }

    async fn try_transcode(
        &self,
        asset: &ImageAsset,
        quality: u8,
    ) -> Result<TranscodeOutcome, OptimizeError> {
        let quality = if quality > 100 {
            warn!("Quality {} is above 100, clamping", quality);
            100
        } else {
            quality
        };
        let deadline = self
            .unit_timeout
            .map(|limit| (tokio::time::Instant::now() + limit, limit));

        let codec = Arc::clone(&self.codec);
        let data = asset.shared_data();
        let bitmap = run_blocking(deadline, OptimizeError::Decode, move || codec.decode(&data))
            .await?;

        let source_dimensions = bitmap.dimensions();
        let output_dimensions = source_dimensions.constrained(self.max_width, self.max_height);
        if source_dimensions != output_dimensions {
            debug!(
                "Scaling {} from {} to {}",
                asset.name(),
                source_dimensions,
                output_dimensions
            );
        }

        let codec = Arc::clone(&self.codec);
        let encoded = run_blocking(deadline, OptimizeError::Encode, move || {
            codec.encode(&bitmap, output_dimensions, quality as f32 / 100.0)
        })
        .await?;

        let optimized = ImageAsset::new(
            optimized_name(asset.name(), self.codec.extension()),
            encoded,
        );
        let compression_rate = compression_rate(asset.byte_size(), optimized.byte_size());

        Ok(TranscodeOutcome::Success {
            original: asset.clone(),
            optimized,
            compression_rate,
            source_dimensions,
            output_dimensions,
        })
    }
}

/// Runs one codec step on the blocking pool and waits for it.
///
/// Past the deadline the step is reported as `Timeout`, but only once the
/// blocking task has finished: a unit never leaves codec work running behind it.
async fn run_blocking<T, F>(
    deadline: Option<(tokio::time::Instant, Duration)>,
    task_error: fn(String) -> OptimizeError,
    work: F,
) -> Result<T, OptimizeError>
where
    F: FnOnce() -> Result<T, OptimizeError> + Send + 'static,
    T: Send + 'static,
{
    let mut task = tokio::task::spawn_blocking(work);

    let joined = match deadline {
        Some((deadline, limit)) => match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                debug!("Deadline of {:?} passed, waiting for the codec to stop", limit);
                // Blocking tasks cannot be aborted.
                let _ = task.await;
                return Err(OptimizeError::Timeout(limit));
            }
        },
        None => task.await,
    };

    joined.map_err(|e| task_error(format!("codec task aborted: {}", e)))?
}

/// Replaces the extension of `name` with `extension`, or appends it when there is none.
///
/// A name whose only dot is the first character (`.hidden`) has no extension.
pub fn optimized_name(name: &str, extension: &str) -> String {
    let base = match name.rfind('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    };
    format!("{}.{}", base, extension)
}

/// Percentage saved from `original_size` to `optimized_size`, rounded to two decimals.
///
/// Zero when the original is empty; negative when the output is larger.
pub fn compression_rate(original_size: u64, optimized_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let saved = original_size as f64 - optimized_size as f64;
    round2(saved / original_size as f64 * 100.0)
}

/// Rounds to two decimal places.
///
/// Results that round to zero are always `+0.0`, so JSON never shows `-0.0`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{jpeg_fixture, png_fixture, ScriptedCodec};
    use crate::codec::DecodedBitmap;
    use crate::resize::ImageDimensions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_optimized_name() {
        assert_eq!(optimized_name("photo.jpg", "webp"), "photo.webp");
        assert_eq!(optimized_name("archive.tar.png", "webp"), "archive.tar.webp");
        assert_eq!(optimized_name("README", "webp"), "README.webp");
        assert_eq!(optimized_name(".hidden", "webp"), ".hidden.webp");
        assert_eq!(optimized_name("trailing.", "webp"), "trailing.webp");
        assert_eq!(optimized_name("already.webp", "webp"), "already.webp");
    }

    #[test]
    fn test_compression_rate() {
        assert_eq!(compression_rate(100, 60), 40.0);
        assert_eq!(compression_rate(3, 1), 66.67);
        assert_eq!(compression_rate(0, 10), 0.0);
        assert_eq!(compression_rate(100, 150), -50.0);
        assert_eq!(compression_rate(100, 0), 100.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(-0.004), 0.0);
        assert!(round2(-0.004).is_sign_positive());
        assert_eq!(serde_json::to_string(&compression_rate(100_000, 100_001)).unwrap(), "0.0");
        assert_eq!(round2(40.0), 40.0);
    }

    #[tokio::test]
    async fn test_transcode_png_success() {
        let processor = ImageProcessor::new(&Config::default());
        let asset = ImageAsset::new("gradient.png", png_fixture(120, 80));

        match processor.transcode(&asset, 80).await {
            TranscodeOutcome::Success {
                original,
                optimized,
                compression_rate: rate,
                source_dimensions,
                output_dimensions,
            } => {
                assert_eq!(original.name(), "gradient.png");
                assert_eq!(optimized.name(), "gradient.webp");
                assert_eq!(&optimized.data()[8..12], b"WEBP");
                assert_eq!(source_dimensions, ImageDimensions::new(120, 80));
                assert_eq!(output_dimensions, source_dimensions);
                assert_eq!(
                    rate,
                    compression_rate(original.byte_size(), optimized.byte_size())
                );
            }
            TranscodeOutcome::Failure { message, .. } => panic!("unexpected failure: {message}"),
        }
    }

    #[tokio::test]
    async fn test_transcode_constrains_large_images() {
        let processor = ImageProcessor::new(&Config::default());
        let asset = ImageAsset::new("wide.jpg", jpeg_fixture(3000, 500));

        let outcome = processor.transcode(&asset, 60).await;
        let optimized = outcome.optimized().expect("wide image should transcode");

        let decoded = WebpCodec::new().decode(optimized.data()).unwrap();
        assert_eq!(decoded.dimensions(), ImageDimensions::new(1920, 320));
        match outcome {
            TranscodeOutcome::Success { output_dimensions, .. } => {
                assert_eq!(output_dimensions, ImageDimensions::new(1920, 320))
            }
            TranscodeOutcome::Failure { .. } => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_transcode_respects_configured_bounds() {
        let config = Config {
            max_width: 50,
            max_height: 50,
            ..Default::default()
        };
        let processor = ImageProcessor::with_codec(&config, ScriptedCodec::new(40, 400, 10));
        let asset = ImageAsset::new("tall.png", vec![b'x'; 20]);

        match processor.transcode(&asset, 80).await {
            TranscodeOutcome::Success { output_dimensions, .. } => {
                assert_eq!(output_dimensions, ImageDimensions::new(5, 50));
            }
            TranscodeOutcome::Failure { message, .. } => panic!("unexpected failure: {message}"),
        }
    }

    #[tokio::test]
    async fn test_corrupt_input_becomes_failure() {
        let processor = ImageProcessor::new(&Config::default());
        let asset = ImageAsset::new("broken.jpg", b"not really a jpeg".to_vec());

        match processor.transcode(&asset, 80).await {
            TranscodeOutcome::Failure {
                original_name,
                original_size,
                message,
            } => {
                assert_eq!(original_name, "broken.jpg");
                assert_eq!(original_size, 17);
                assert!(message.starts_with("Failed to decode image"), "{message}");
            }
            TranscodeOutcome::Success { .. } => panic!("corrupt input must not succeed"),
        }
    }

    #[tokio::test]
    async fn test_encode_error_becomes_failure() {
        let processor =
            ImageProcessor::with_codec(&Config::default(), ScriptedCodec::new(10, 10, 5));
        let asset = ImageAsset::new("e.png", vec![b'E'; 8]);

        let outcome = processor.transcode(&asset, 80).await;
        let message = outcome.error_message().unwrap();
        assert!(message.starts_with("Failed to encode image"), "{message}");
    }

    #[tokio::test]
    async fn test_empty_input_is_failure_with_zero_size() {
        let processor = ImageProcessor::new(&Config::default());
        let outcome = processor.transcode(&ImageAsset::new("empty.png", Vec::new()), 80).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.original_size(), 0);
    }

    #[tokio::test]
    async fn test_quality_above_100_is_clamped() {
        let processor =
            ImageProcessor::with_codec(&Config::default(), ScriptedCodec::new(10, 10, 5));
        let outcome = processor.transcode(&ImageAsset::new("a.png", vec![b'x'; 10]), 250).await;
        assert!(outcome.is_success());
    }

    /// Codec whose decode takes 150 ms and records how many decodes overlap.
    #[derive(Default)]
    struct SlowCodec {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Codec for SlowCodec {
        fn extension(&self) -> &'static str {
            "webp"
        }

        fn decode(&self, _bytes: &[u8]) -> Result<DecodedBitmap, OptimizeError> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(DecodedBitmap::new(image::DynamicImage::new_rgba8(4, 4)))
        }

        fn encode(
            &self,
            _bitmap: &DecodedBitmap,
            _target: ImageDimensions,
            _quality: f32,
        ) -> Result<Vec<u8>, OptimizeError> {
            Ok(vec![0u8; 4])
        }
    }

    fn timeout_config(millis: u64) -> Config {
        Config {
            unit_timeout: Some(Duration::from_millis(millis)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let processor = ImageProcessor::with_codec(&timeout_config(20), SlowCodec::default());
        let outcome = processor.transcode(&ImageAsset::new("slow.png", vec![1u8; 4]), 80).await;

        let message = outcome.error_message().unwrap();
        assert!(message.contains("timed out"), "{message}");
    }

    #[tokio::test]
    async fn test_timed_out_units_never_overlap() {
        let codec = SlowCodec::default();
        let in_flight = Arc::clone(&codec.in_flight);
        let peak = Arc::clone(&codec.peak);
        let processor = ImageProcessor::with_codec(&timeout_config(10), codec);

        for i in 0..4 {
            let asset = ImageAsset::new(format!("slow{}.png", i), vec![1u8; 4]);
            let outcome = processor.transcode(&asset, 80).await;

            assert!(outcome.error_message().unwrap().contains("timed out"));
            assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
