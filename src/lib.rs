//! # Image Batch Optimizer Library
//!
//! Converte batch di immagini in WebP, limitandone le dimensioni, e ne riporta
//! il risparmio in byte.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della libreria
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Il core lavora su buffer in memoria: il filesystem è confinato in
//!   `file_manager` e nel binario
//!
//! ## Architettura dei moduli:
//! - `codec`: decode di JPEG/PNG/GIF/WebP ed encode WebP lossy (trait `Codec`)
//! - `resize`: policy di riduzione dentro un bounding box
//! - `image_processor`: trascodifica di una singola immagine
//! - `optimizer`: orchestratore sequenziale del batch
//! - `export`: statistiche aggregate e archivio ZIP
//! - `asset` / `outcome`: modello dati
//! - `config` / `error`: configurazione e tipi di errore
//! - `file_manager`, `progress`, `json_output`: I/O e reporting
//!
//! ## Utilizzo:
//! ```ignore
//! use image_batch_optimizer::{BatchOptimizer, Config, export};
//!
//! let optimizer = BatchOptimizer::new(Config::default())?;
//! let results = optimizer.run(&assets, |p| println!("{}%", p.percent())).await;
//! let stats = export::aggregate(&results);
//! let zip = export::package(&results, optimizer.config().archive_naming)?;
//! ```

pub mod asset;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod outcome;
pub mod progress;
pub mod resize;

pub use asset::ImageAsset;
pub use codec::{probe_format_support, Codec, WebpCodec};
pub use config::Config;
pub use error::OptimizeError;
pub use export::{aggregate, package, AggregateStats, ArchiveNaming};
pub use image_processor::ImageProcessor;
pub use optimizer::BatchOptimizer;
pub use outcome::{BatchProgress, BatchResult, TranscodeOutcome};
pub use resize::{constrain, ImageDimensions};
