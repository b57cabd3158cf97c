//! Classifier set used by every classification cycle

use std::sync::Arc;

use animal_lens_types::{ClassifierRole, Result};
use animal_lens_vision::{ClassificationRequest, CropAndScale, ImageClassifier, OnnxClassifier};

use crate::config::Config;

/// The two requests issued for each picked image, in submission order
#[derive(Debug, Clone)]
pub struct Classifiers {
    pub info: ClassificationRequest,
    pub detect: ClassificationRequest,
}

impl Classifiers {
    /// Load both ONNX models named in the config
    pub fn load(config: &Config) -> Result<Self> {
        let info = OnnxClassifier::load(ClassifierRole::Info.label(), &config.info_model)?;
        let detect = OnnxClassifier::load(ClassifierRole::Detect.label(), &config.detect_model)?;
        Ok(Self::new(Arc::new(info), Arc::new(detect), config.crop))
    }

    pub fn new(
        info: Arc<dyn ImageClassifier>,
        detect: Arc<dyn ImageClassifier>,
        crop: CropAndScale,
    ) -> Self {
        Self {
            info: ClassificationRequest::new(ClassifierRole::Info, info).with_crop(crop),
            detect: ClassificationRequest::new(ClassifierRole::Detect, detect).with_crop(crop),
        }
    }
}
