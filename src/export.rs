//! # Export Module
//!
//! Aggregazione dei risultati di un batch ed esportazione in archivio ZIP.
//!
//! ## Responsabilità:
//! - `aggregate`: somma le dimensioni dei soli successi e calcola il risparmio
//! - `package`: crea uno ZIP con tutte le immagini ottimizzate sotto una
//!   singola directory `optimized-images/`
//! - `archive_file_name`: nome del file ZIP con timestamp, per evitare
//!   collisioni tra run diversi
//!
//! ## Nomi duplicati
//!
//! Due input `photo.jpg` e `photo.png` producono entrambi `photo.webp`. Di
//! default vince l'ultimo (`ArchiveNaming::LastWriterWins`) e viene loggato un
//! warning; con `ArchiveNaming::IndexSuffix` i duplicati diventano
//! `photo-<indice>.webp`, dove l'indice è la posizione nel batch.
//!
//! ## Error Handling
//!
//! - Una entry che non si riesce a scrivere viene loggata e saltata
//! - Se nessuna entry viene aggiunta (pur essendoci successi), o se il
//!   container non si chiude, l'errore arriva al chiamante come
//!   `OptimizeError::Archive`
//! - Un batch senza successi produce un archivio valido e vuoto

use crate::error::OptimizeError;
use crate::image_processor::round2;
use crate::outcome::TranscodeOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Seek, Write};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Top-level directory inside the archive
pub const ARCHIVE_DIRECTORY: &str = "optimized-images";

/// DEFLATE level used for archive entries
const COMPRESSION_LEVEL: i32 = 6;

/// How duplicate output names are handled inside an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveNaming {
    /// Later images replace earlier ones with the same name
    #[default]
    LastWriterWins,
    /// Duplicates get `-<batch index>` appended to their base name
    IndexSuffix,
}

/// Size totals for a batch, computed from its successful outcomes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total_original_size: u64,
    pub total_optimized_size: u64,
    /// Negative when the optimized images are larger in total
    pub total_savings_bytes: i64,
    pub total_savings_percent: f64,
    pub succeeded: usize,
    pub failed: usize,
}

/// Sums the sizes of all successful outcomes. Failures only count towards `failed`.
pub fn aggregate(results: &[TranscodeOutcome]) -> AggregateStats {
    let mut total_original_size = 0u64;
    let mut total_optimized_size = 0u64;
    let mut succeeded = 0;
    let mut failed = 0;

    for outcome in results {
        match outcome {
            TranscodeOutcome::Success {
                original,
                optimized,
                ..
            } => {
                total_original_size += original.byte_size();
                total_optimized_size += optimized.byte_size();
                succeeded += 1;
            }
            TranscodeOutcome::Failure { .. } => failed += 1,
        }
    }

    let total_savings_bytes = total_original_size as i64 - total_optimized_size as i64;
    let total_savings_percent = if total_original_size > 0 {
        round2(total_savings_bytes as f64 / total_original_size as f64 * 100.0)
    } else {
        0.0
    };

    AggregateStats {
        total_original_size,
        total_optimized_size,
        total_savings_bytes,
        total_savings_percent,
        succeeded,
        failed,
    }
}

/// File name for an archive created at `timestamp`, e.g.
/// `optimized-images-2024-05-01T10-20-30.zip`.
pub fn archive_file_name(timestamp: DateTime<Utc>) -> String {
    format!(
        "{}-{}.zip",
        ARCHIVE_DIRECTORY,
        timestamp.format("%Y-%m-%dT%H-%M-%S")
    )
}

struct ArchiveEntry<'a> {
    name: String,
    data: &'a [u8],
}

/// Builds a ZIP with the optimized payload of every successful outcome.
pub fn package(
    results: &[TranscodeOutcome],
    naming: ArchiveNaming,
) -> Result<Vec<u8>, OptimizeError> {
    let entries = collect_entries(results, naming);
    let cursor = write_archive(ZipSink::new(Cursor::new(Vec::new())), &entries)?;
    Ok(cursor.into_inner())
}

fn collect_entries(results: &[TranscodeOutcome], naming: ArchiveNaming) -> Vec<ArchiveEntry<'_>> {
    let mut entries: Vec<ArchiveEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();

    for (index, outcome) in results.iter().enumerate() {
        let Some(optimized) = outcome.optimized() else {
            continue;
        };
        let name = optimized.name().to_string();

        match naming {
            ArchiveNaming::LastWriterWins => {
                if let Some(&position) = positions.get(&name) {
                    warn!(
                        "Duplicate name {} in archive: {} replaces an earlier image",
                        name,
                        outcome.original_name()
                    );
                    entries[position].data = optimized.data();
                    continue;
                }
                positions.insert(name.clone(), entries.len());
                entries.push(ArchiveEntry {
                    name,
                    data: optimized.data(),
                });
            }
            ArchiveNaming::IndexSuffix => {
                // `taken` also holds the suffixed names handed out so far.
                let name = if taken.contains(&name) {
                    let unique = suffixed_name(&name, index, &taken);
                    debug!("Duplicate name {} in archive, storing as {}", name, unique);
                    unique
                } else {
                    name
                };
                taken.insert(name.clone());
                entries.push(ArchiveEntry {
                    name,
                    data: optimized.data(),
                });
            }
        }
    }

    entries
}

/// `photo.webp` + 3 → `photo-3.webp`, extended until the name is free.
fn suffixed_name(name: &str, index: usize, taken: &HashSet<String>) -> String {
    let (base, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };

    let mut suffix = index.to_string();
    loop {
        let candidate = format!("{}-{}{}", base, suffix, extension);
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix.push_str(&format!("-{}", index));
    }
}

/// Destination for archive entries.
trait ArchiveSink {
    type Output;

    fn add_directory(&mut self, path: &str) -> Result<(), OptimizeError>;
    fn add_file(&mut self, path: &str, data: &[u8]) -> Result<(), OptimizeError>;
    fn finish(self) -> Result<Self::Output, OptimizeError>;
}

/// ZIP container, DEFLATE at `COMPRESSION_LEVEL`
struct ZipSink<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: FileOptions,
}

impl<W: Write + Seek> ZipSink<W> {
    fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(COMPRESSION_LEVEL)),
        }
    }
}

impl<W: Write + Seek> ArchiveSink for ZipSink<W> {
    type Output = W;

    fn add_directory(&mut self, path: &str) -> Result<(), OptimizeError> {
        self.zip.add_directory(path, self.options)?;
        Ok(())
    }

    fn add_file(&mut self, path: &str, data: &[u8]) -> Result<(), OptimizeError> {
        self.zip.start_file(path, self.options)?;
        self.zip.write_all(data)?;
        Ok(())
    }

    fn finish(mut self) -> Result<W, OptimizeError> {
        Ok(self.zip.finish()?)
    }
}

fn write_archive<S: ArchiveSink>(
    mut sink: S,
    entries: &[ArchiveEntry<'_>],
) -> Result<S::Output, OptimizeError> {
    sink.add_directory(ARCHIVE_DIRECTORY)
        .map_err(|e| OptimizeError::Archive(e.to_string()))?;

    let mut added = 0;
    for entry in entries {
        let path = format!("{}/{}", ARCHIVE_DIRECTORY, entry.name);
        match sink.add_file(&path, entry.data) {
            Ok(()) => added += 1,
            Err(e) => warn!(
                "{}",
                OptimizeError::ArchiveEntry {
                    name: entry.name.clone(),
                    reason: e.to_string(),
                }
            ),
        }
    }

    if added == 0 && !entries.is_empty() {
        return Err(OptimizeError::Archive(format!(
            "none of the {} optimized images could be added",
            entries.len()
        )));
    }

    let output = sink
        .finish()
        .map_err(|e| OptimizeError::Archive(e.to_string()))?;
    debug!("Archive written with {} of {} images", added, entries.len());
    Ok(output)
}
