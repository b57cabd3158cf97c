//! Core types for animal classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One (label, confidence) entry produced by a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Class label reported by the model
    pub identifier: String,
    /// Probability between 0.0 and 1.0
    pub confidence: f32,
}

impl Observation {
    pub fn new(identifier: impl Into<String>, confidence: f32) -> Self {
        Self {
            identifier: identifier.into(),
            confidence,
        }
    }

    /// Confidence as a whole percentage, rounded to the nearest integer
    pub fn percent(&self) -> i64 {
        (self.confidence as f64 * 100.0).round() as i64
    }
}

/// How the stored pixels must be transformed to appear upright.
///
/// Variant names follow the EXIF `Orientation` tag (values 1-8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    LeftMirrored,
    Right,
    RightMirrored,
    Left,
}

impl ImageOrientation {
    /// Map an EXIF orientation value. Out-of-range values are treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => ImageOrientation::UpMirrored,
            3 => ImageOrientation::Down,
            4 => ImageOrientation::DownMirrored,
            5 => ImageOrientation::LeftMirrored,
            6 => ImageOrientation::Right,
            7 => ImageOrientation::RightMirrored,
            8 => ImageOrientation::Left,
            _ => ImageOrientation::Up,
        }
    }
}

/// Where a picked image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Camera,
    Library,
}

impl ImageSource {
    pub fn label(&self) -> &'static str {
        match self {
            ImageSource::Camera => "camera",
            ImageSource::Library => "library",
        }
    }
}

/// Which of the two classifiers a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierRole {
    /// Descriptive labels (species, breed, ...)
    Info,
    /// Animal / non-animal determination
    Detect,
}

impl ClassifierRole {
    pub fn label(&self) -> &'static str {
        match self {
            ClassifierRole::Info => "info",
            ClassifierRole::Detect => "detect",
        }
    }
}

impl std::fmt::Display for ClassifierRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a single classification request produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Ranked observations, highest confidence first
    Observations { observations: Vec<Observation> },
    /// The request ran but reported an error instead of results
    Failed { description: String },
}

impl RequestOutcome {
    pub fn observations(observations: Vec<Observation>) -> Self {
        RequestOutcome::Observations { observations }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        RequestOutcome::Failed {
            description: description.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RequestOutcome::Failed { .. })
    }
}

/// Joined output of one classification cycle (both requests)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Monotonic id of the submission this report answers
    pub cycle: u64,
    /// Image that was classified
    pub image: PathBuf,
    pub info: RequestOutcome,
    pub detect: RequestOutcome,
    pub classified_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}
