//! # Progress Reporting Module
//!
//! Feedback visivo durante il batch e riepilogo finale.
//!
//! ## Responsabilità:
//! - Progress bar con `indicatif`, avanzata una volta per immagine
//! - Riga di stato per ogni immagine completata (`outcome_message`)
//! - Riepilogo testuale di un `AggregateStats` (dimensioni, risparmio, errori)
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [========================>---------------] 6/10 (60%)
//! ```

use crate::export::AggregateStats;
use crate::file_manager::FileManager;
use crate::outcome::{BatchProgress, TranscodeOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Manages the terminal progress bar for one batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Hidden bar, for tests and `--json` runs
    pub fn hidden(total_files: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_files);
        Self { bar }
    }

    /// Moves the bar to the snapshot's position.
    pub fn update(&self, progress: BatchProgress) {
        self.bar.set_position(progress.processed_count as u64);
        if progress.is_complete() {
            self.bar.set_message("done");
        }
    }

    /// Prints the outcome of one image above the bar.
    pub fn report(&self, outcome: &TranscodeOutcome) {
        self.bar.println(outcome_message(outcome));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// One-line status for a finished image.
pub fn outcome_message(outcome: &TranscodeOutcome) -> String {
    match outcome {
        TranscodeOutcome::Success {
            original,
            compression_rate,
            ..
        } => format!("✅ {}: {:.2}% saved", original.name(), compression_rate),
        TranscodeOutcome::Failure {
            original_name,
            message,
            ..
        } => format!("❌ {}: {}", original_name, message),
    }
}

pub fn format_summary(stats: &AggregateStats) -> String {
    let savings = if stats.total_savings_bytes >= 0 {
        FileManager::format_size(stats.total_savings_bytes.unsigned_abs())
    } else {
        format!(
            "-{}",
            FileManager::format_size(stats.total_savings_bytes.unsigned_abs())
        )
    };

    format!(
        "Optimized: {} | Errors: {} | Original: {} | Optimized: {} | Total saved: {} ({:.2}%)",
        stats.succeeded,
        stats.failed,
        FileManager::format_size(stats.total_original_size),
        FileManager::format_size(stats.total_optimized_size),
        savings,
        stats.total_savings_percent
    )
}
