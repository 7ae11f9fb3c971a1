//! # Image Optimizer - Main Entry Point
//!
//! Front end a riga di comando per la libreria.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging con `tracing` (su stderr)
//! - Discovery e caricamento delle immagini dalla directory di input
//! - Avvio del batch, con progress bar o messaggi JSON
//! - Scrittura delle immagini ottimizzate e/o dell'archivio ZIP
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI e configura il logging
//! 2. Verifica il supporto WebP (solo warning se manca)
//! 3. Trova e carica le immagini
//! 4. Esegue il batch e mostra l'esito di ogni immagine appena completata
//! 5. Scrive output e archivio, stampa il riepilogo
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-optimizer ./photos --quality 75 --output ./optimized --archive . --verbose
//! ```

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use image_batch_optimizer::{
    export::{self, ArchiveNaming},
    file_manager::FileManager,
    json_output::JsonMessage,
    probe_format_support,
    progress::{format_summary, ProgressManager},
    BatchOptimizer, Config, TranscodeOutcome,
};

#[derive(Parser)]
#[command(name = "image-optimizer")]
#[command(about = "Convert images to WebP, cap their size and report the savings")]
struct Args {
    /// Directory containing the images to optimize
    input: PathBuf,

    /// WebP quality (0-100)
    #[arg(short, long, default_value = "80")]
    quality: u8,

    /// Maximum output width in pixels
    #[arg(long, default_value = "1920")]
    max_width: u32,

    /// Maximum output height in pixels
    #[arg(long, default_value = "1080")]
    max_height: u32,

    /// Directory where the optimized images are written
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory where a timestamped ZIP of the optimized images is written
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Per-image time limit in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Keep duplicate names in the archive by appending the batch index
    #[arg(long)]
    index_suffix: bool,

    /// Emit JSON lines on stdout instead of the progress bar
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let json = args.json;
    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if json {
                JsonMessage::error(e.to_string(), Some(format!("{:?}", e))).emit();
            }
            Err(e)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    if !args.input.is_dir() {
        return Err(anyhow::anyhow!(
            "Input directory does not exist: {}",
            args.input.display()
        ));
    }

    let config = Config {
        webp_quality: args.quality,
        max_width: args.max_width,
        max_height: args.max_height,
        unit_timeout: args.timeout.map(Duration::from_secs),
        archive_naming: if args.index_suffix {
            ArchiveNaming::IndexSuffix
        } else {
            ArchiveNaming::LastWriterWins
        },
        json_output: args.json,
    };
    let optimizer = BatchOptimizer::new(config)?;
    let config = optimizer.config();

    if !probe_format_support() {
        let message = "WebP encoding does not appear to be supported; conversions may fail";
        warn!("{}", message);
        if config.json_output {
            JsonMessage::warning(message).emit();
        }
    }

    let paths = FileManager::find_image_files(&args.input)?;
    info!("Found {} images in {}", paths.len(), args.input.display());
    let assets = FileManager::load_assets(&paths).await?;

    if config.json_output {
        JsonMessage::start(args.input.clone(), assets.len(), config).emit();
    }

    let start_time = Instant::now();
    let progress = if config.json_output {
        ProgressManager::hidden(assets.len() as u64)
    } else {
        ProgressManager::new(assets.len() as u64)
    };

    let results = optimizer
        .run_batch_with_outcomes(&assets, config.webp_quality, |outcome, snapshot| {
            if config.json_output {
                JsonMessage::file_complete(outcome).emit();
                JsonMessage::progress(snapshot).emit();
            } else {
                progress.report(outcome);
            }
            progress.update(snapshot);
        })
        .await;

    let stats = export::aggregate(&results);
    progress.finish(&format_summary(&stats));

    if let Some(output_dir) = &args.output {
        let written = FileManager::write_optimized(&results, output_dir).await?;
        info!("Wrote {} optimized images to {}", written, output_dir.display());
    }

    let archive = match &args.archive {
        Some(dir) => Some(write_archive(&results, config.archive_naming, dir).await?),
        None => None,
    };

    if config.json_output {
        JsonMessage::complete(stats, start_time.elapsed().as_secs_f64(), archive).emit();
    } else {
        println!("{}", format_summary(&stats));
    }

    Ok(())
}

async fn write_archive(
    results: &[TranscodeOutcome],
    naming: ArchiveNaming,
    dir: &Path,
) -> Result<PathBuf> {
    let bytes = export::package(results, naming)?;
    let file_name = export::archive_file_name(Utc::now());
    let path = FileManager::write_archive(&bytes, dir, &file_name).await?;
    info!("📦 Archive written to {}", path.display());
    Ok(path)
}
