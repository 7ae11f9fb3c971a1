//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della pipeline.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione dei parametri di input
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! La configurazione vive solo per la durata di un run: non viene mai letta
//! né salvata su file.
//!
//! ## Parametri di configurazione:
//! - `webp_quality`: Qualità WebP (0-100, default: 80)
//! - `max_width` / `max_height`: Limiti di dimensione (default: 1920x1080)
//! - `unit_timeout`: Deadline opzionale per singola immagine (default: nessuna)
//! - `archive_naming`: Gestione nomi duplicati nell'archivio (default: last writer wins)
//! - `json_output`: Output JSON per uso programmatico (default: false)
//!
//! ## Validazione:
//! - Controlla che webp_quality sia 0-100 (warning sotto 20)
//! - Controlla che max_width e max_height siano > 0
//! - Controlla che unit_timeout, se presente, sia > 0
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     webp_quality: 85,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::OptimizeError;
use crate::export::ArchiveNaming;
use crate::resize::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Lowest quality the settings UI offers; the core accepts anything in 0-100.
pub const RECOMMENDED_MIN_QUALITY: u8 = 20;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// WebP quality (0-100)
    pub webp_quality: u8,
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Maximum output height in pixels
    pub max_height: u32,
    /// Optional deadline for a single image (None = wait forever)
    pub unit_timeout: Option<Duration>,
    /// How duplicate output names are handled inside the archive
    pub archive_naming: ArchiveNaming,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webp_quality: 80,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            unit_timeout: None,
            archive_naming: ArchiveNaming::default(),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.webp_quality > 100 {
            return Err(OptimizeError::Validation(
                "WebP quality must be between 0 and 100".to_string(),
            )
            .into());
        }

        if self.webp_quality < RECOMMENDED_MIN_QUALITY {
            warn!(
                "WebP quality {} is below the recommended minimum of {}",
                self.webp_quality, RECOMMENDED_MIN_QUALITY
            );
        }

        if self.max_width == 0 || self.max_height == 0 {
            return Err(OptimizeError::Validation(
                "Maximum width and height must be greater than 0".to_string(),
            )
            .into());
        }

        if let Some(timeout) = self.unit_timeout {
            if timeout.is_zero() {
                return Err(OptimizeError::Validation(
                    "Per-image timeout must be greater than 0".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }
}
