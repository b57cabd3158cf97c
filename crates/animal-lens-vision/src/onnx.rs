//! ONNX model loading and execution with `tract-onnx`

use std::path::{Path, PathBuf};
use std::time::Instant;

use animal_lens_types::{Error, Observation, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tract_onnx::prelude::*;

use crate::classifier::{rank_scores, softmax, ImageClassifier};
use crate::labels::load_labels;
use crate::preprocess::{crop_and_scale, to_nchw, CropAndScale};

/// ImageNet channel statistics, used by most exported classifiers
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Where a model lives and how its input is laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxModelSpec {
    /// Path to the `.onnx` file
    pub model_path: PathBuf,
    /// Path to the labels file (one label per output index)
    pub labels_path: PathBuf,
    /// Square input edge in pixels
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_mean")]
    pub mean: [f32; 3],
    #[serde(default = "default_std")]
    pub std: [f32; 3],
    /// Apply softmax to raw outputs (disable for models that emit probabilities)
    #[serde(default = "default_true")]
    pub apply_softmax: bool,
}

fn default_input_size() -> u32 {
    224
}

fn default_mean() -> [f32; 3] {
    IMAGENET_MEAN
}

fn default_std() -> [f32; 3] {
    IMAGENET_STD
}

fn default_true() -> bool {
    true
}

impl OnnxModelSpec {
    pub fn new(model_path: PathBuf, labels_path: PathBuf) -> Self {
        Self {
            model_path,
            labels_path,
            input_size: default_input_size(),
            mean: default_mean(),
            std: default_std(),
            apply_softmax: true,
        }
    }
}

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Image classifier running an ONNX model on the CPU
pub struct OnnxClassifier {
    name: String,
    plan: OnnxPlan,
    labels: Vec<String>,
    spec: OnnxModelSpec,
}

impl OnnxClassifier {
    /// Load and optimise the model described by `spec`
    pub fn load(name: impl Into<String>, spec: &OnnxModelSpec) -> Result<Self> {
        let name = name.into();

        if !spec.model_path.exists() {
            return Err(Error::Model(format!(
                "{} model not found: {}",
                name,
                spec.model_path.display()
            )));
        }

        let labels = load_labels(&spec.labels_path)?;
        let started = Instant::now();
        let plan = build_plan(&spec.model_path, spec.input_size)
            .map_err(|e| Error::Model(format!("failed to load {}: {e}", spec.model_path.display())))?;

        tracing::info!(
            classifier = %name,
            model = %spec.model_path.display(),
            labels = labels.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded ONNX classifier"
        );

        Ok(Self {
            name,
            plan,
            labels,
            spec: spec.clone(),
        })
    }

    fn run(&self, data: Vec<f32>) -> TractResult<Vec<f32>> {
        let size = self.spec.input_size as usize;
        let input: Tensor = tract_ndarray::Array4::from_shape_vec((1, 3, size, size), data)?.into();
        let outputs = self.plan.run(tvec!(input.into()))?;
        let scores = outputs[0].to_array_view::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}

fn build_plan(model_path: &Path, input_size: u32) -> TractResult<OnnxPlan> {
    let size = input_size as usize;
    tract_onnx::onnx()
        .model_for_path(model_path)?
        .with_input_fact(0, f32::fact([1, 3, size, size]).into())?
        .into_optimized()?
        .into_runnable()
}

impl ImageClassifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, image: &DynamicImage, crop: CropAndScale) -> Result<Vec<Observation>> {
        let started = Instant::now();
        let prepared = crop_and_scale(image, self.spec.input_size, crop);
        let data = to_nchw(&prepared, self.spec.mean, self.spec.std);

        let raw = self
            .run(data)
            .map_err(|e| Error::Model(format!("{} inference failed: {e}", self.name)))?;

        if raw.len() != self.labels.len() {
            return Err(Error::Model(format!(
                "{} produced {} scores but has {} labels",
                self.name,
                raw.len(),
                self.labels.len()
            )));
        }

        let scores = if self.spec.apply_softmax {
            softmax(&raw)
        } else {
            raw
        };

        tracing::debug!(
            classifier = %self.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "inference complete"
        );

        Ok(rank_scores(&scores, &self.labels))
    }
}
