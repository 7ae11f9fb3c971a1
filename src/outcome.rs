//! # Outcome Types Module
//!
//! Tipi prodotti dalla pipeline per ogni immagine e per l'intero batch.
//!
//! ## Tipi principali:
//! - `TranscodeOutcome`: `Success` o `Failure`, esattamente uno per input
//! - `BatchProgress`: snapshot `processed/total` emesso dopo ogni immagine
//! - `BatchResult`: sequenza ordinata di outcome, nello stesso ordine degli input

use crate::asset::ImageAsset;
use crate::resize::ImageDimensions;
use serde::Serialize;

/// Result of transcoding one image
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscodeOutcome {
    Success {
        original: ImageAsset,
        optimized: ImageAsset,
        /// Size reduction in percent, rounded to two decimals (negative if the image grew)
        compression_rate: f64,
        source_dimensions: ImageDimensions,
        output_dimensions: ImageDimensions,
    },
    Failure {
        original_name: String,
        original_size: u64,
        message: String,
    },
}

impl TranscodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TranscodeOutcome::Success { .. })
    }

    /// Name of the submitted image, for either variant.
    pub fn original_name(&self) -> &str {
        match self {
            TranscodeOutcome::Success { original, .. } => original.name(),
            TranscodeOutcome::Failure { original_name, .. } => original_name,
        }
    }

    /// Size of the submitted image, for either variant.
    pub fn original_size(&self) -> u64 {
        match self {
            TranscodeOutcome::Success { original, .. } => original.byte_size(),
            TranscodeOutcome::Failure { original_size, .. } => *original_size,
        }
    }

    /// The optimized asset, if the image was transcoded.
    pub fn optimized(&self) -> Option<&ImageAsset> {
        match self {
            TranscodeOutcome::Success { optimized, .. } => Some(optimized),
            TranscodeOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TranscodeOutcome::Success { .. } => None,
            TranscodeOutcome::Failure { message, .. } => Some(message),
        }
    }
}

/// Progress snapshot emitted after each image completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub processed_count: usize,
    pub total_count: usize,
}

impl BatchProgress {
    /// Completion in percent, rounded to the nearest integer.
    pub fn percent(&self) -> u8 {
        if self.total_count == 0 {
            return 100;
        }
        ((self.processed_count as f64 / self.total_count as f64) * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.processed_count == self.total_count
    }
}

/// One outcome per submitted image, in submission order
pub type BatchResult = Vec<TranscodeOutcome>;
