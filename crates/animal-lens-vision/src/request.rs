//! Classification requests and the per-image handler that performs them

use std::sync::Arc;
use std::time::Instant;

use animal_lens_types::{ClassifierRole, Error, RequestOutcome, Result};
use image::DynamicImage;

use crate::classifier::ImageClassifier;
use crate::picked::PickedImage;
use crate::preprocess::CropAndScale;

/// A configured classifier plus its crop option
#[derive(Clone)]
pub struct ClassificationRequest {
    pub role: ClassifierRole,
    pub classifier: Arc<dyn ImageClassifier>,
    pub crop: CropAndScale,
}

impl ClassificationRequest {
    pub fn new(role: ClassifierRole, classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            role,
            classifier,
            crop: CropAndScale::default(),
        }
    }

    pub fn with_crop(mut self, crop: CropAndScale) -> Self {
        self.crop = crop;
        self
    }
}

impl std::fmt::Debug for ClassificationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRequest")
            .field("role", &self.role)
            .field("classifier", &self.classifier.name())
            .field("crop", &self.crop)
            .finish()
    }
}

/// Holds the upright pixels of one picked image and runs requests on them
#[derive(Debug, Clone)]
pub struct RequestHandler {
    image: DynamicImage,
}

impl RequestHandler {
    pub fn new(picked: &PickedImage) -> Self {
        Self {
            image: picked.upright(),
        }
    }

    /// Run one request.
    ///
    /// `Err` means the request could not be submitted at all; a classifier
    /// error is reported as `Ok(RequestOutcome::Failed)`.
    pub fn perform(&self, request: &ClassificationRequest) -> Result<RequestOutcome> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(Error::Submission(format!(
                "{} request received an empty image",
                request.role
            )));
        }

        let started = Instant::now();
        let outcome = match request.classifier.classify(&self.image, request.crop) {
            Ok(observations) => RequestOutcome::observations(observations),
            Err(e) => {
                tracing::warn!(role = %request.role, error = %e, "classifier reported an error");
                RequestOutcome::failed(e.to_string())
            }
        };

        tracing::debug!(
            role = %request.role,
            classifier = request.classifier.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request performed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animal_lens_types::{ImageOrientation, Observation};
    use image::RgbImage;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Recording {
        crops: Mutex<Vec<CropAndScale>>,
    }

    impl ImageClassifier for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn classify(&self, image: &DynamicImage, crop: CropAndScale) -> Result<Vec<Observation>> {
            self.crops.lock().unwrap().push(crop);
            Ok(vec![Observation::new(
                format!("{}x{}", image.width(), image.height()),
                1.0,
            )])
        }
    }

    struct Broken;

    impl ImageClassifier for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn classify(&self, _image: &DynamicImage, _crop: CropAndScale) -> Result<Vec<Observation>> {
            Err(Error::Model("graph has no outputs".to_string()))
        }
    }

    fn picked(width: u32, height: u32, orientation: ImageOrientation) -> PickedImage {
        PickedImage::from_image(
            PathBuf::from("test.png"),
            DynamicImage::ImageRgb8(RgbImage::new(width, height)),
            orientation,
        )
    }

    #[test]
    fn test_perform_uses_upright_pixels_and_crop() {
        let classifier = Arc::new(Recording {
            crops: Mutex::new(Vec::new()),
        });
        let request = ClassificationRequest::new(ClassifierRole::Info, classifier.clone())
            .with_crop(CropAndScale::ScaleFit);

        let handler = RequestHandler::new(&picked(4, 2, ImageOrientation::Right));
        let outcome = handler.perform(&request).unwrap();

        assert_eq!(
            outcome,
            RequestOutcome::observations(vec![Observation::new("2x4", 1.0)])
        );
        assert_eq!(*classifier.crops.lock().unwrap(), vec![CropAndScale::ScaleFit]);
    }

    #[test]
    fn test_classifier_error_becomes_failed_outcome() {
        let request = ClassificationRequest::new(ClassifierRole::Detect, Arc::new(Broken));
        let handler = RequestHandler::new(&picked(2, 2, ImageOrientation::Up));

        let outcome = handler.perform(&request).unwrap();
        match outcome {
            RequestOutcome::Failed { description } => {
                assert!(description.contains("graph has no outputs"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_image_is_submission_error() {
        let request = ClassificationRequest::new(ClassifierRole::Info, Arc::new(Broken));
        let handler = RequestHandler::new(&picked(0, 0, ImageOrientation::Up));

        assert!(matches!(handler.perform(&request), Err(Error::Submission(_))));
    }
}
