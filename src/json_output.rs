//! # JSON Output Module
//!
//! Output strutturato in JSON, una riga per evento, per chi pilota il tool da
//! un'altra applicazione (UI, script).
//!
//! ## Tipi di messaggi:
//! - `start`: inizio batch
//! - `progress`: snapshot dopo ogni immagine
//! - `file_complete`: esito di una singola immagine
//! - `complete`: statistiche aggregate finali
//! - `warning`: problemi non bloccanti (es. probe WebP fallito)
//! - `error`: errore generale

use crate::config::Config;
use crate::export::AggregateStats;
use crate::outcome::{BatchProgress, TranscodeOutcome};
use crate::resize::ImageDimensions;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        input_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    Progress {
        current: usize,
        total: usize,
        percentage: u8,
    },

    FileComplete {
        name: String,
        original_size: u64,
        optimized_size: Option<u64>,
        compression_rate: Option<f64>,
        output_dimensions: Option<ImageDimensions>,
        error: Option<String>,
    },

    Complete {
        #[serde(flatten)]
        stats: AggregateStats,
        duration_seconds: f64,
        archive: Option<PathBuf>,
    },

    Warning {
        message: String,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

/// Settings echoed back in the `start` message
#[derive(Debug, Serialize)]
pub struct JsonConfig {
    pub webp_quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    pub timeout_seconds: Option<f64>,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            webp_quality: config.webp_quality,
            max_width: config.max_width,
            max_height: config.max_height,
            timeout_seconds: config.unit_timeout.map(|t| t.as_secs_f64()),
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input_dir: PathBuf, total_files: usize, config: &Config) -> Self {
        Self::Start {
            input_dir,
            total_files,
            config: config.into(),
        }
    }

    pub fn progress(progress: BatchProgress) -> Self {
        Self::Progress {
            current: progress.processed_count,
            total: progress.total_count,
            percentage: progress.percent(),
        }
    }

    pub fn file_complete(outcome: &TranscodeOutcome) -> Self {
        match outcome {
            TranscodeOutcome::Success {
                original,
                optimized,
                compression_rate,
                output_dimensions,
                ..
            } => Self::FileComplete {
                name: original.name().to_string(),
                original_size: original.byte_size(),
                optimized_size: Some(optimized.byte_size()),
                compression_rate: Some(*compression_rate),
                output_dimensions: Some(*output_dimensions),
                error: None,
            },
            TranscodeOutcome::Failure {
                original_name,
                original_size,
                message,
            } => Self::FileComplete {
                name: original_name.clone(),
                original_size: *original_size,
                optimized_size: None,
                compression_rate: None,
                output_dimensions: None,
                error: Some(message.clone()),
            },
        }
    }

    pub fn complete(stats: AggregateStats, duration_seconds: f64, archive: Option<PathBuf>) -> Self {
        Self::Complete {
            stats,
            duration_seconds,
            archive,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_value(message: &JsonMessage) -> Value {
        serde_json::to_value(message).unwrap()
    }

    #[test]
    fn test_progress_message() {
        let message = JsonMessage::progress(BatchProgress {
            processed_count: 1,
            total_count: 4,
        });
        assert_eq!(
            to_value(&message),
            json!({"type": "progress", "current": 1, "total": 4, "percentage": 25})
        );
    }

    #[test]
    fn test_file_complete_failure() {
        let outcome = TranscodeOutcome::Failure {
            original_name: "bad.png".into(),
            original_size: 12,
            message: "Failed to decode image: eof".into(),
        };
        let value = to_value(&JsonMessage::file_complete(&outcome));

        assert_eq!(value["type"], "file_complete");
        assert_eq!(value["name"], "bad.png");
        assert_eq!(value["optimized_size"], Value::Null);
        assert_eq!(value["error"], "Failed to decode image: eof");
    }

    #[test]
    fn test_complete_flattens_stats() {
        let stats = AggregateStats {
            total_original_size: 100,
            total_optimized_size: 60,
            total_savings_bytes: 40,
            total_savings_percent: 40.0,
            succeeded: 1,
            failed: 1,
        };
        let value = to_value(&JsonMessage::complete(stats, 1.5, None));

        assert_eq!(value["type"], "complete");
        assert_eq!(value["total_savings_bytes"], 40);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["archive"], Value::Null);
    }

    #[test]
    fn test_start_echoes_config() {
        let value = to_value(&JsonMessage::start("in".into(), 3, &Config::default()));
        assert_eq!(value["config"]["webp_quality"], 80);
        assert_eq!(value["config"]["max_width"], 1920);
        assert_eq!(value["config"]["timeout_seconds"], Value::Null);
    }
}
