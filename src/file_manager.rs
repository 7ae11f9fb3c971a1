//! # File Management Module
//!
//! Operazioni sul filesystem attorno al batch: il core lavora solo su buffer in
//! memoria, questo modulo li carica e li scrive.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva delle immagini in una directory (ordine stabile)
//! - Caricamento dei file in `ImageAsset`
//! - Scrittura delle immagini ottimizzate e dell'archivio ZIP
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! JPG, JPEG, PNG, GIF, WebP (per estensione, case-insensitive)

use crate::asset::ImageAsset;
use crate::outcome::TranscodeOutcome;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all supported images under `input_dir`, sorted by path
    pub fn find_image_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_image(path))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Check if a file is a supported image
    pub fn is_image(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Reads every file into an asset named after its file name.
    pub async fn load_assets(paths: &[PathBuf]) -> Result<Vec<ImageAsset>> {
        let mut assets = Vec::with_capacity(paths.len());
        for path in paths {
            let data = fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            assets.push(ImageAsset::new(name, data));
        }
        Ok(assets)
    }

    /// Writes the optimized payload of every success into `output_dir`.
    ///
    /// Images with the same output name overwrite each other in batch order.
    /// Returns the number of files written.
    pub async fn write_optimized(results: &[TranscodeOutcome], output_dir: &Path) -> Result<usize> {
        fs::create_dir_all(output_dir).await?;

        let mut written = 0;
        for optimized in results.iter().filter_map(TranscodeOutcome::optimized) {
            let target = output_dir.join(optimized.name());
            fs::write(&target, optimized.data())
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;
            debug!("Wrote {} ({} bytes)", target.display(), optimized.byte_size());
            written += 1;
        }
        Ok(written)
    }

    /// Writes archive bytes to `dir/file_name` and returns the full path.
    pub async fn write_archive(bytes: &[u8], dir: &Path, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let target = dir.join(file_name);
        fs::write(&target, bytes)
            .await
            .with_context(|| format!("Failed to write archive {}", target.display()))?;
        Ok(target)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
