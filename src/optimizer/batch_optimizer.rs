//! # Batch Optimizer Module
//!
//! Questo è il modulo che orchestra un intero batch di ottimizzazione.
//!
//! ## Responsabilità:
//! - Esegue l'`ImageProcessor` su ogni immagine, **in ordine e una alla volta**
//! - Notifica il progresso dopo ogni immagine (successo o errore)
//! - Isola gli errori: un'immagine corrotta non blocca le successive
//! - Restituisce un `BatchResult` con un outcome per input, nello stesso ordine
//!
//! ## Flusso di esecuzione:
//! 1. **Inizializzazione**: valida la config, crea il processor
//! 2. **Processing sequenziale**: `transcode` awaited per ogni asset
//! 3. **Progress tracking**: `on_progress(processed, total)` dopo ogni asset
//!    (oppure `on_item(outcome, progress)` con `run_batch_with_outcomes`)
//! 4. **Reporting**: log finale con successi, errori e risparmio
//!
//! ## Gestione concorrenza:
//! - Nessun parallelismo tra immagini: al massimo una bitmap decodificata e un
//!   buffer codificato in memoria alla volta
//! - Nessuna cancellazione a metà batch: ogni asset viene sempre processato
//!
//! ## Esempio:
//! ```ignore
//! let optimizer = BatchOptimizer::new(Config::default())?;
//! let results = optimizer
//!     .run_batch(&assets, 80, |p| println!("{}/{}", p.processed_count, p.total_count))
//!     .await;
//! assert_eq!(results.len(), assets.len());
//! ```

use crate::{
    asset::ImageAsset,
    codec::{Codec, WebpCodec},
    config::Config,
    export::aggregate,
    image_processor::ImageProcessor,
    optimizer::progress_tracker::ProgressTracker,
    outcome::{BatchProgress, BatchResult, TranscodeOutcome},
    progress::format_summary,
};
use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info};

/// Sequential batch orchestrator
pub struct BatchOptimizer<C: Codec = WebpCodec> {
    config: Config,
    processor: ImageProcessor<C>,
}

impl BatchOptimizer<WebpCodec> {
    /// Create a new batch optimizer using the WebP codec
    pub fn new(config: Config) -> Result<Self> {
        Self::with_codec(config, WebpCodec::new())
    }
}

impl<C: Codec> BatchOptimizer<C> {
    /// Create a new batch optimizer with a custom codec
    pub fn with_codec(config: Config, codec: C) -> Result<Self> {
        config.validate()?;
        let processor = ImageProcessor::with_codec(&config, codec);
        Ok(Self { config, processor })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the batch at the configured quality.
    pub async fn run<F>(&self, assets: &[ImageAsset], on_progress: F) -> BatchResult
    where
        F: FnMut(BatchProgress),
    {
        self.run_batch(assets, self.config.webp_quality, on_progress)
            .await
    }

    /// Transcodes every asset in order and returns one outcome per asset.
    ///
    /// `on_progress` is called exactly once per asset, after its outcome is
    /// stored, with `processed_count` going from 1 to `assets.len()`.
    pub async fn run_batch<F>(
        &self,
        assets: &[ImageAsset],
        quality: u8,
        mut on_progress: F,
    ) -> BatchResult
    where
        F: FnMut(BatchProgress),
    {
        self.run_batch_with_outcomes(assets, quality, |_, progress| on_progress(progress))
            .await
    }

    /// Like `run_batch`, but the callback also receives the outcome just stored.
    pub async fn run_batch_with_outcomes<F>(
        &self,
        assets: &[ImageAsset],
        quality: u8,
        mut on_item: F,
    ) -> BatchResult
    where
        F: FnMut(&TranscodeOutcome, BatchProgress),
    {
        let start_time = Instant::now();
        info!(
            "🎯 Optimizing {} images to WebP (quality: {}, max size: {}x{})",
            assets.len(),
            quality,
            self.config.max_width,
            self.config.max_height
        );

        let mut tracker = ProgressTracker::new(assets.len());
        let mut results = BatchResult::with_capacity(assets.len());

        for (index, asset) in assets.iter().enumerate() {
            debug!(
                "[{}/{}] Processing {} ({} bytes)",
                index + 1,
                assets.len(),
                asset.name(),
                asset.byte_size()
            );

            let outcome = self.processor.transcode(asset, quality).await;
            let progress = tracker.record(&outcome);
            results.push(outcome);
            if let Some(stored) = results.last() {
                on_item(stored, progress);
            }
        }

        info!(
            "Batch finished in {:?}: {} optimized, {} failed",
            start_time.elapsed(),
            tracker.succeeded(),
            tracker.failed()
        );
        if !results.is_empty() {
            info!("{}", format_summary(&aggregate(&results)));
        }

        results
    }
}
