use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;

use facevault_core::encryption::domain::encryption_key::EncryptionKey;
use facevault_core::encryption::domain::key_provider::KeyProvider;
use facevault_core::encryption::infrastructure::aes_gcm_cipher::AesGcmCipher;
use facevault_core::encryption::infrastructure::configured_key_provider::ConfiguredKeyProvider;
use facevault_core::imaging::domain::crop::crop_image_file;
use facevault_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use facevault_core::matching::domain::sealed_comparison::{compare_sealed, evaluate_sealed};
use facevault_core::pipeline::face_pipeline::FacePipeline;
use facevault_core::shared::bounding_box::BoundingBox;
use facevault_core::shared::config::ResolvedConfig;

/// Face detection, encrypted face features and face comparison.
#[derive(Parser)]
#[command(name = "facevault")]
struct Cli {
    /// JSON configuration file (defaults to $FACEVAULT_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Haar cascade XML to use instead of the cached/downloaded model.
    #[arg(long, global = true)]
    cascade: Option<PathBuf>,

    /// Fail instead of generating an ephemeral key when none is configured.
    #[arg(long, global = true)]
    require_key: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect faces and print one JSON result per image.
    Detect {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Window growth per pyramid step (> 1.0).
        #[arg(long)]
        scale_factor: Option<f64>,

        /// Overlapping candidates a detection needs to be kept.
        #[arg(long)]
        min_neighbors: Option<usize>,

        /// Smallest face to look for, as WIDTHxHEIGHT.
        #[arg(long, value_parser = parse_size)]
        min_size: Option<(u32, u32)>,
    },
    /// Detect faces in every image of a directory and print a report.
    Scan { directory: PathBuf },
    /// Cut a face region out of an image.
    Crop {
        image: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        left: i32,
        #[arg(long, allow_hyphen_values = true)]
        top: i32,
        #[arg(long, allow_hyphen_values = true)]
        right: i32,
        #[arg(long, allow_hyphen_values = true)]
        bottom: i32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compare two encrypted feature blobs.
    Compare {
        blob_a: String,
        blob_b: String,

        /// Similarity a match must exceed (defaults to the configured value).
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Print the full outcome as JSON instead of true/false.
        #[arg(long)]
        explain: bool,
    },
    /// Print a freshly generated encryption key.
    Keygen,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = ResolvedConfig::load(cli.config.as_deref())?;
    if let Some(cascade) = cli.cascade {
        config.cascade_path = Some(cascade);
    }
    config.require_key |= cli.require_key;

    match cli.command {
        Command::Detect {
            images,
            scale_factor,
            min_neighbors,
            min_size,
        } => {
            if let Some(s) = scale_factor {
                config.detection.scale_factor = s;
            }
            if let Some(n) = min_neighbors {
                config.detection.min_neighbors = n;
            }
            if let Some(size) = min_size {
                config.detection.min_size = size;
            }
            config.validate()?;
            run_detect(&config, &images)
        }
        Command::Scan { directory } => run_scan(&config, &directory),
        Command::Crop {
            image,
            left,
            top,
            right,
            bottom,
            output,
        } => run_crop(&image, BoundingBox::new(left, top, right, bottom)?, &output),
        Command::Compare {
            blob_a,
            blob_b,
            threshold,
            explain,
        } => run_compare(&config, &blob_a, &blob_b, threshold, explain),
        Command::Keygen => {
            println!("{}", EncryptionKey::generate().to_encoded());
            Ok(())
        }
    }
}

fn run_detect(config: &ResolvedConfig, images: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = build_pipeline(config)?;
    let mut failed = 0usize;
    for path in images {
        match pipeline.detect_faces(path) {
            Ok(detection) => {
                let line = json!({ "filename": path.display().to_string(), "detection": detection });
                println!("{line}");
            }
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {} images failed", images.len()).into());
    }
    Ok(())
}

fn run_scan(config: &ResolvedConfig, directory: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = build_pipeline(config)?;
    let report = pipeline.scan_directory(directory)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Only decodes and crops, so no cascade or key is needed.
fn run_crop(image: &Path, bbox: BoundingBox, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    crop_image_file(&ImageFileReader::new(), image, &bbox)?.save(output)?;
    log::info!(
        "Saved {}x{} crop to {}",
        bbox.width(),
        bbox.height(),
        output.display()
    );
    Ok(())
}

/// Needs only the key; the cascade is never resolved.
fn run_compare(
    config: &ResolvedConfig,
    blob_a: &str,
    blob_b: &str,
    threshold: Option<f64>,
    explain: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let provided = ConfiguredKeyProvider::from_env(
        config.encryption_key.clone(),
        &config.key_env,
        config.missing_key_policy(),
    )
    .provide()?;
    let cipher = AesGcmCipher::new(&provided.key);
    let threshold = threshold.unwrap_or(config.match_threshold);

    if explain {
        let outcome = evaluate_sealed(&cipher, blob_a, blob_b, threshold);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", compare_sealed(&cipher, blob_a, blob_b, threshold));
    }
    Ok(())
}

fn build_pipeline(config: &ResolvedConfig) -> Result<FacePipeline, Box<dyn std::error::Error>> {
    Ok(FacePipeline::from_config(config, Some(Box::new(download_progress)))?)
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
