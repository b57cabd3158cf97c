//! Command handlers

use crate::cli::{Cli, Commands};
use crate::output::{output_batch_summary, output_report};
use animal_lens_app::batch::run_batch;
use animal_lens_app::config::Config;
use animal_lens_app::dispatch::classify_now;
use animal_lens_app::format::{compose_message, CLASSIFYING};
use animal_lens_app::models::Classifiers;
use animal_lens_app::scanner::{scan_directory, validate_image};
use animal_lens_app::source::CaptureDevice;
use animal_lens_types::{ConfigError, Error, OutputFormat, Result};
use animal_lens_vision::{CropAndScale, PickedImage};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(ref path) => path.clone(),
        None => Config::config_path()?,
    };

    match &cli.command {
        Commands::Classify { image, crop } => {
            let mut config = Config::load_from(&config_path)?;
            if let Some(crop) = crop {
                config.crop = *crop;
            }
            let output_format = cli.format.unwrap_or(config.output_format);
            cmd_classify(&config, image, output_format)
        }

        Commands::Capture { keep } => {
            let config = Config::load_from(&config_path)?;
            let output_format = cli.format.unwrap_or(config.output_format);
            cmd_capture(&config, *keep, output_format)
        }

        Commands::Batch {
            folder,
            output,
            jobs,
        } => {
            let config = Config::load_from(&config_path)?;
            // Use CLI jobs if specified, otherwise default 4. 0 = auto CPU count.
            let job_count = match jobs {
                Some(0) => num_cpus::get(),
                Some(n) => *n,
                None => 4,
            };
            let output_format = cli.format.unwrap_or(config.output_format);
            cmd_batch(&config, folder, output.clone(), job_count, output_format)
        }

        Commands::Config {
            show,
            set_info_model,
            set_info_labels,
            set_detect_model,
            set_detect_labels,
            set_crop,
            set_max_results,
            set_non_animal_label,
            set_threshold,
            set_capture_cmd,
            set_output,
            reset,
        } => cmd_config(
            &config_path,
            ConfigChanges {
                info_model: set_info_model.clone(),
                info_labels: set_info_labels.clone(),
                detect_model: set_detect_model.clone(),
                detect_labels: set_detect_labels.clone(),
                crop: *set_crop,
                max_results: *set_max_results,
                non_animal_label: set_non_animal_label.clone(),
                threshold: *set_threshold,
                capture_cmd: set_capture_cmd.clone(),
                output: *set_output,
            },
            *show,
            *reset,
        ),
    }
}

fn cmd_classify(config: &Config, image: &Path, output_format: OutputFormat) -> Result<()> {
    validate_image(image)?;

    // Conversion failures propagate as fatal errors
    let picked = PickedImage::open(image)?;
    let classifiers = Classifiers::load(config)?;

    if output_format == OutputFormat::Table {
        eprintln!("{}", CLASSIFYING);
    }

    let report = classify_now(1, &picked, &classifiers)?;
    let message = compose_message(&report.info, &report.detect, &config.format_rules());
    output_report(output_format, &report, &message)
}

fn cmd_capture(config: &Config, keep: bool, output_format: OutputFormat) -> Result<()> {
    let device = CaptureDevice::from_command(config.capture_command.clone());
    if !device.is_available() {
        return Err(Error::Capture(
            "no capture command configured; set one with `animal-lens config --set-capture-cmd`, \
             or classify an existing file with `animal-lens classify <IMAGE>`"
                .to_string(),
        ));
    }

    let Some(path) = device.capture()? else {
        eprintln!("Capture cancelled");
        return Ok(());
    };

    let result = cmd_classify(config, &path, output_format);

    if keep {
        eprintln!("Captured image kept at {}", path.display());
    } else if let Err(e) = std::fs::remove_file(&path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove captured image");
    }

    result
}

fn cmd_batch(
    config: &Config,
    folder: &Path,
    output: Option<PathBuf>,
    jobs: usize,
    output_format: OutputFormat,
) -> Result<()> {
    let images = scan_directory(folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!(
            "No images found in {}",
            folder.display()
        )));
    }

    let classifiers = Classifiers::load(config)?;
    tracing::info!(images = images.len(), jobs, "starting batch");

    let pb = ProgressBar::new(images.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let summary = run_batch(&images, &classifiers, &config.format_rules(), jobs, &|entry| {
        if let Some(name) = entry.image.file_name() {
            pb.set_message(name.to_string_lossy().to_string());
        }
        pb.inc(1);
    });

    pb.finish_with_message("Complete");

    if let Some(ref path) = output {
        let content = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, content)?;
        eprintln!("Results written to {}", path.display());
    }

    output_batch_summary(output_format, &summary)
}

/// Values passed with `config --set-*`
struct ConfigChanges {
    info_model: Option<PathBuf>,
    info_labels: Option<PathBuf>,
    detect_model: Option<PathBuf>,
    detect_labels: Option<PathBuf>,
    crop: Option<CropAndScale>,
    max_results: Option<usize>,
    non_animal_label: Option<String>,
    threshold: Option<f32>,
    capture_cmd: Option<String>,
    output: Option<OutputFormat>,
}

fn cmd_config(path: &Path, changes: ConfigChanges, show: bool, reset: bool) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save_to(path)?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load_from(path)?;
    let mut modified = false;

    if let Some(model) = changes.info_model {
        config.info_model.model_path = model;
        modified = true;
    }

    if let Some(labels) = changes.info_labels {
        config.info_model.labels_path = labels;
        modified = true;
    }

    if let Some(model) = changes.detect_model {
        config.detect_model.model_path = model;
        modified = true;
    }

    if let Some(labels) = changes.detect_labels {
        config.detect_model.labels_path = labels;
        modified = true;
    }

    if let Some(crop) = changes.crop {
        config.crop = crop;
        modified = true;
    }

    if let Some(max_results) = changes.max_results {
        config.max_results = max_results;
        modified = true;
    }

    if let Some(label) = changes.non_animal_label {
        if label.trim().is_empty() {
            return Err(ConfigError::InvalidValue("non-animal label cannot be empty".to_string()).into());
        }
        config.non_animal_label = label;
        modified = true;
    }

    if let Some(threshold) = changes.threshold {
        config.non_animal_threshold = threshold;
        modified = true;
    }

    if let Some(cmd) = changes.capture_cmd {
        config.capture_command = if cmd.trim().is_empty() { None } else { Some(cmd) };
        modified = true;
    }

    if let Some(output_format) = changes.output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save_to(path)?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
