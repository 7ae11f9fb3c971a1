//! # Progress Tracking Module
//!
//! Contatori del batch corrente. Il batch è sequenziale, quindi il tracker è
//! posseduto e mutato solo dall'orchestratore: niente `Arc<Mutex<_>>`.

use crate::outcome::{BatchProgress, TranscodeOutcome};

/// Counts completed images for one batch run
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_files: usize,
    processed: usize,
    succeeded: usize,
    failed: usize,
}

impl ProgressTracker {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    /// Records one completed image and returns the new snapshot.
    pub fn record(&mut self, outcome: &TranscodeOutcome) -> BatchProgress {
        debug_assert!(self.processed < self.total_files, "more outcomes than inputs");
        self.processed += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> BatchProgress {
        BatchProgress {
            processed_count: self.processed,
            total_count: self.total_files,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
