//! CLI definition using clap

use animal_lens_types::OutputFormat;
use animal_lens_vision::CropAndScale;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "animal-lens")]
#[command(version)]
#[command(about = "Detect and describe animals in photos with on-device classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a single image
    Classify {
        /// Path to image file
        image: PathBuf,

        /// Crop option override (center_crop, scale_fit, scale_fill)
        #[arg(long)]
        crop: Option<CropAndScale>,
    },

    /// Take a photo with the configured capture command and classify it
    Capture {
        /// Keep the captured file instead of deleting it afterwards
        #[arg(long)]
        keep: bool,
    },

    /// Classify every image in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        /// Write the JSON summary to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Number of parallel classifications. 0 = auto (CPU count). Uses 4 if not specified.
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set info model path (.onnx)
        #[arg(long)]
        set_info_model: Option<PathBuf>,

        /// Set info labels path
        #[arg(long)]
        set_info_labels: Option<PathBuf>,

        /// Set detect model path (.onnx)
        #[arg(long)]
        set_detect_model: Option<PathBuf>,

        /// Set detect labels path
        #[arg(long)]
        set_detect_labels: Option<PathBuf>,

        /// Set crop option (center_crop, scale_fit, scale_fill)
        #[arg(long)]
        set_crop: Option<CropAndScale>,

        /// Set number of observations considered per classifier
        #[arg(long)]
        set_max_results: Option<usize>,

        /// Set the detect label that means "no animal"
        #[arg(long)]
        set_non_animal_label: Option<String>,

        /// Set the confidence at which the non-animal label wins (0.0-1.0)
        #[arg(long)]
        set_threshold: Option<f32>,

        /// Set capture command (use {output} for the target file, "" to disable)
        #[arg(long)]
        set_capture_cmd: Option<String>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
