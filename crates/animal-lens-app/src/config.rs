//! Configuration management for animal-lens
//!
//! Config stored at: ~/.config/animal-lens/config.json

use animal_lens_types::{ConfigError, OutputFormat, Result};
use animal_lens_vision::{CropAndScale, OnnxModelSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::format::FormatRules;

const APP_DIR: &str = "animal-lens";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Descriptive classifier (species labels)
    #[serde(default = "default_info_model")]
    pub info_model: OnnxModelSpec,

    /// Animal / non-animal classifier
    #[serde(default = "default_detect_model")]
    pub detect_model: OnnxModelSpec,

    /// How images are fitted to the model input
    #[serde(default)]
    pub crop: CropAndScale,

    /// Observations considered per classifier
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Detect-model label meaning "no animal in this image"
    #[serde(default = "default_non_animal_label")]
    pub non_animal_label: String,

    /// Confidence at which the non-animal label overrides the result
    #[serde(default = "default_non_animal_threshold")]
    pub non_animal_threshold: f32,

    /// Command that captures a photo (enables the camera source)
    #[serde(default)]
    pub capture_command: Option<String>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn models_dir() -> PathBuf {
    Config::config_dir()
        .unwrap_or_else(|_| std::env::temp_dir().join(APP_DIR))
        .join("models")
}

fn default_info_model() -> OnnxModelSpec {
    let dir = models_dir();
    OnnxModelSpec::new(dir.join("info.onnx"), dir.join("info.labels.txt"))
}

fn default_detect_model() -> OnnxModelSpec {
    let dir = models_dir();
    OnnxModelSpec::new(dir.join("detect.onnx"), dir.join("detect.labels.txt"))
}

fn default_max_results() -> usize {
    6
}

fn default_non_animal_label() -> String {
    "Animals".to_string()
}

fn default_non_animal_threshold() -> f32 {
    0.99
}

impl Default for Config {
    fn default() -> Self {
        Self {
            info_model: default_info_model(),
            detect_model: default_detect_model(),
            crop: CropAndScale::default(),
            max_results: default_max_results(),
            non_animal_label: default_non_animal_label(),
            non_animal_threshold: default_non_animal_threshold(),
            capture_command: None,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(ConfigError::InvalidValue("max_results must be at least 1".to_string()).into());
        }
        if !(0.0..=1.0).contains(&self.non_animal_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "non_animal_threshold must be within 0.0..=1.0, got {}",
                self.non_animal_threshold
            ))
            .into());
        }
        for spec in [&self.info_model, &self.detect_model] {
            if spec.input_size == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "input_size must be positive for {}",
                    spec.model_path.display()
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Formatting rules derived from this config
    pub fn format_rules(&self) -> FormatRules {
        FormatRules {
            max_results: self.max_results,
            non_animal_label: self.non_animal_label.clone(),
            non_animal_threshold: self.non_animal_threshold,
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Animal Lens Configuration")?;
        writeln!(f, "=========================")?;
        writeln!(f)?;
        writeln!(f, "Info model:       {}", self.info_model.model_path.display())?;
        writeln!(f, "Info labels:      {}", self.info_model.labels_path.display())?;
        writeln!(f, "Detect model:     {}", self.detect_model.model_path.display())?;
        writeln!(f, "Detect labels:    {}", self.detect_model.labels_path.display())?;
        writeln!(f, "Crop:             {}", self.crop)?;
        writeln!(f, "Max results:      {}", self.max_results)?;
        writeln!(f, "Non-animal label: {}", self.non_animal_label)?;
        writeln!(f, "Threshold:        {:.2}", self.non_animal_threshold)?;
        writeln!(
            f,
            "Capture command:  {}",
            self.capture_command.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "Output format:    {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}
