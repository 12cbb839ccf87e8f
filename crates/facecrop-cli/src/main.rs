//! Batch face alignment from the command line.
//!
//! Usage:
//!   facecrop --input-dir raw/ --output-dir aligned/ --landmarks-dir landmarks/
//!   facecrop ... --image-size 512 --workers 4
//!   facecrop ... --config facecrop.json -v

use std::path::PathBuf;

use clap::Parser;
use facecrop_core::{BatchConfig, BatchPipeline, BatchReport, SidecarLandmarkSource};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "facecrop")]
#[command(author, version, about = "Align and crop faces in a directory of photos", long_about = None)]
struct Args {
    /// Directory of input photos
    #[arg(long)]
    input_dir: PathBuf,

    /// Directory for aligned crops (created if missing)
    #[arg(long)]
    output_dir: PathBuf,

    /// Directory of `<image stem>.json` landmark files
    #[arg(long)]
    landmarks_dir: PathBuf,

    /// Side of the square output images
    #[arg(long)]
    image_size: Option<u32>,

    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (default: one per CPU)
    #[arg(long)]
    workers: Option<usize>,

    /// JPEG quality for .jpg outputs
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Largest accepted nose-to-eye distance ratio
    #[arg(long)]
    threshold: Option<f64>,

    /// Log per-image details
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn batch_config(&self) -> Result<BatchConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_json_file(path)?,
            None => BatchConfig::default(),
        };
        if let Some(size) = self.image_size {
            config.image_size = size;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(quality) = self.jpeg_quality {
            config.jpeg_quality = quality;
        }
        if let Some(threshold) = self.threshold {
            config.align.frontality_threshold = threshold;
        }
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args) {
        Ok(report) => println!("{report}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let config = args.batch_config()?;
    info!(
        "image size {}, frontality threshold {:.2}, landmarks from {}",
        config.image_size,
        config.align.frontality_threshold,
        args.landmarks_dir.display()
    );

    let source = SidecarLandmarkSource::new(&args.landmarks_dir);
    let pipeline = BatchPipeline::new(source, config)?;
    Ok(pipeline.run(&args.input_dir, &args.output_dir)?)
}
