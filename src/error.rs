//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi, mostrati così come sono all'utente
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Decode`: Input non decodificabile (corrotto, troncato, formato sconosciuto)
//! - `Encode`: Il codec non riesce a produrre output (superficie vuota, backend)
//! - `Timeout`: Una singola unità ha superato la deadline configurata
//! - `ArchiveEntry`: Una singola entry dell'archivio non è stata scritta
//! - `Archive`: Fallimento totale della generazione dell'archivio
//! - `Validation`: Errori di validazione della configurazione
//! - `Io` / `Zip`: Errori di I/O e del container ZIP
//!
//! ## Contenimento:
//! - `Decode`, `Encode` e `Timeout` non attraversano mai il confine del batch:
//!   vengono convertiti in `TranscodeOutcome::Failure`
//! - `ArchiveEntry` viene loggato e la generazione continua
//! - Solo `Archive` arriva al chiamante come errore vero e proprio
//!
//! ## Esempio:
//! ```ignore
//! if width == 0 || height == 0 {
//!     return Err(OptimizeError::Encode("zero-area surface".to_string()));
//! }
//! ```

/// Custom error types for image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Processing timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Failed to add {name} to archive: {reason}")]
    ArchiveEntry { name: String, reason: String },

    #[error("Failed to create archive: {0}")]
    Archive(String),

    #[error("Configuration error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
