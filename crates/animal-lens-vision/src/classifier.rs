//! Classifier trait and score ranking

use animal_lens_types::{Observation, Result};
use image::DynamicImage;

use crate::preprocess::CropAndScale;

/// An image classifier backed by some pre-trained model
pub trait ImageClassifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Classify an upright image.
    ///
    /// Returns every class with its confidence, highest first.
    fn classify(&self, image: &DynamicImage, crop: CropAndScale) -> Result<Vec<Observation>>;
}

/// Numerically stable softmax
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; scores.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Pair scores with labels and sort by descending confidence.
///
/// The sort is stable, so equal scores keep model output order.
pub fn rank_scores(scores: &[f32], labels: &[String]) -> Vec<Observation> {
    let mut observations: Vec<Observation> = labels
        .iter()
        .zip(scores.iter())
        .map(|(label, score)| Observation::new(label.clone(), *score))
        .collect();

    observations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    observations
}
