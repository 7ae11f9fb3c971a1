//! # Dimension Constraint Module
//!
//! Questo modulo calcola le dimensioni di output di un'immagine in modo che
//! rientrino nei limiti massimi configurati preservando l'aspect ratio.
//!
//! ## Caratteristiche
//! - **Funzione pura**: nessun I/O, nessuno stato
//! - **Singolo ramo**: la larghezza viene controllata per prima; se supera il
//!   limite, l'altezza scalata NON viene ricontrollata nello stesso passaggio
//! - **Arrotondamento**: l'asse vincolato prende esattamente il limite, l'altro
//!   viene troncato all'intero inferiore (minimo 1)
//!
//! ## Esempi
//! ```text
//! 3840x1080 -> 1920x540   (vincolo sulla larghezza)
//! 1920x2160 ->  960x1080  (vincolo sull'altezza)
//!  800x600  ->  800x600   (già nei limiti)
//! 4000x8000 -> 1920x3840  (supera entrambi: corretto solo sulla larghezza)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum output width
pub const DEFAULT_MAX_WIDTH: u32 = 1920;
/// Default maximum output height
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Pixel dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels; zero means nothing can be drawn.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Applies [`constrain`] to these dimensions.
    pub fn constrained(self, max_width: u32, max_height: u32) -> Self {
        let (width, height) = constrain(self.width, self.height, max_width, max_height);
        Self { width, height }
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Fits `(width, height)` inside `max_width x max_height`, preserving aspect ratio.
///
/// Only one axis is corrected per call. When the width is over the limit the
/// image is scaled against the width alone, even if the resulting height is
/// still above `max_height`; only images whose width already fits are scaled
/// against the height.
pub fn constrain(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        (width, height)
    } else if width > max_width {
        (max_width, scale_axis(height, max_width, width))
    } else {
        (scale_axis(width, max_height, height), max_height)
    }
}

/// `floor(value * numerator / denominator)`, never below 1.
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = value as u64 * numerator as u64 / denominator as u64;
    scaled.clamp(1, u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = DEFAULT_MAX_WIDTH;
    const H: u32 = DEFAULT_MAX_HEIGHT;

    #[test]
    fn test_within_bounds_unchanged() {
        assert_eq!(constrain(800, 600, W, H), (800, 600));
        assert_eq!(constrain(1920, 1080, W, H), (1920, 1080));
        assert_eq!(constrain(1, 1, W, H), (1, 1));
    }

    #[test]
    fn test_wide_image_scaled_by_width() {
        assert_eq!(constrain(3840, 1080, W, H), (1920, 540));
        assert_eq!(constrain(4000, 3000, W, H), (1920, 1440));
    }

    #[test]
    fn test_tall_image_scaled_by_height() {
        assert_eq!(constrain(1920, 2160, W, H), (960, 1080));
        assert_eq!(constrain(1000, 3000, W, H), (360, 1080));
    }

    #[test]
    fn test_rounding_truncates() {
        // 1080 * 1920 / 2000 = 1036.8
        assert_eq!(constrain(2000, 1080, W, H), (1920, 1036));
        // 1000 * 1080 / 1081 = 999.07
        assert_eq!(constrain(1000, 1081, W, H), (999, 1080));
    }

    #[test]
    fn test_extreme_ratio_never_collapses_to_zero() {
        assert_eq!(constrain(100_000, 10, W, H), (1920, 1));
        assert_eq!(constrain(1, 100_000, W, H), (1, 1080));
    }

    #[test]
    fn test_both_bounds_exceeded_only_width_corrected() {
        let once = constrain(4000, 8000, W, H);
        assert_eq!(once, (1920, 3840));
        assert!(once.1 > H);
        // A second pass corrects the remaining axis.
        assert_eq!(constrain(once.0, once.1, W, H), (540, 1080));
    }

    #[test]
    fn test_idempotent_when_first_pass_fits() {
        let samples = [
            (800, 600),
            (3840, 1080),
            (1920, 2160),
            (5000, 2000),
            (640, 4000),
            (2001, 999),
            (7680, 4320),
        ];
        for (w, h) in samples {
            let once = constrain(w, h, W, H);
            assert!(once.0 <= W && once.1 <= H, "{w}x{h} -> {once:?}");
            assert_eq!(constrain(once.0, once.1, W, H), once, "{w}x{h}");
        }
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        let (w, h) = constrain(4000, 3000, W, H);
        let original = 4000.0 / 3000.0;
        let scaled = w as f64 / h as f64;
        assert!((original - scaled).abs() < 0.01);
    }

    #[test]
    fn test_dimensions_helpers() {
        let dims = ImageDimensions::new(3840, 2160);
        assert_eq!(dims.area(), 3840 * 2160);
        assert_eq!(dims.constrained(W, H), ImageDimensions::new(1920, 1080));
        assert_eq!(dims.to_string(), "3840x2160");
        assert_eq!(ImageDimensions::new(0, 10).area(), 0);
    }
}
