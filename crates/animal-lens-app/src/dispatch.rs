//! Classification dispatch
//!
//! Each submission runs both requests sequentially on one background
//! thread and sends back a single joined report.

use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::Instant;

use animal_lens_types::{CycleReport, RequestOutcome, Result};
use animal_lens_vision::{PickedImage, RequestHandler};
use chrono::Utc;

use crate::models::Classifiers;

/// Perform the info request, then the detect request, on the same image.
pub fn run_cycle(
    handler: &RequestHandler,
    classifiers: &Classifiers,
) -> Result<(RequestOutcome, RequestOutcome)> {
    let info = handler.perform(&classifiers.info)?;
    let detect = handler.perform(&classifiers.detect)?;
    Ok((info, detect))
}

/// Classify a picked image on the calling thread.
pub fn classify_now(cycle: u64, picked: &PickedImage, classifiers: &Classifiers) -> Result<CycleReport> {
    let started = Instant::now();
    let handler = RequestHandler::new(picked);
    let (info, detect) = run_cycle(&handler, classifiers)?;

    Ok(CycleReport {
        cycle,
        image: picked.path.clone(),
        info,
        detect,
        classified_at: Utc::now(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

/// An in-flight classification cycle
#[derive(Debug)]
pub struct Submission {
    pub cycle: u64,
    /// Yields exactly one report, or disconnects if the cycle was dropped
    pub receiver: Receiver<CycleReport>,
}

/// Hands picked images to background classification threads
pub struct Dispatcher {
    classifiers: Classifiers,
    next_cycle: u64,
}

impl Dispatcher {
    pub fn new(classifiers: Classifiers) -> Self {
        Self {
            classifiers,
            next_cycle: 1,
        }
    }

    /// Submit an image for classification on a background thread.
    ///
    /// Submission failures are logged and the receiver disconnects without
    /// producing a report.
    pub fn submit(&mut self, picked: &PickedImage) -> Submission {
        let cycle = self.next_cycle;
        self.next_cycle += 1;

        let (sender, receiver) = channel();
        let classifiers = self.classifiers.clone();
        let picked = picked.clone();

        tracing::info!(cycle, image = %picked.path.display(), "submitting image for classification");

        let spawned = thread::Builder::new()
            .name(format!("classify-{cycle}"))
            .spawn(move || match classify_now(cycle, &picked, &classifiers) {
                Ok(report) => {
                    tracing::debug!(cycle, elapsed_ms = report.elapsed_ms, "classification cycle complete");
                    // The screen may have moved on to a newer pick
                    let _ = sender.send(report);
                }
                Err(e) => {
                    tracing::error!(cycle, error = %e, "Failed to perform classification");
                }
            });

        if let Err(e) = spawned {
            tracing::error!(cycle, error = %e, "Failed to start classification thread");
        }

        Submission { cycle, receiver }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animal_lens_types::{Error, ImageOrientation, Observation};
    use animal_lens_vision::{CropAndScale, ImageClassifier};
    use image::{DynamicImage, RgbImage};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Fixed {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        observations: Vec<Observation>,
    }

    impl ImageClassifier for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn classify(&self, _image: &DynamicImage, _crop: CropAndScale) -> Result<Vec<Observation>> {
            self.log.lock().unwrap().push(self.name);
            Ok(self.observations.clone())
        }
    }

    fn classifiers(log: &Arc<Mutex<Vec<&'static str>>>) -> Classifiers {
        Classifiers::new(
            Arc::new(Fixed {
                name: "info",
                log: log.clone(),
                observations: vec![Observation::new("Dog", 0.9)],
            }),
            Arc::new(Fixed {
                name: "detect",
                log: log.clone(),
                observations: vec![Observation::new("Dogs", 0.95)],
            }),
            CropAndScale::CenterCrop,
        )
    }

    fn picked(width: u32) -> PickedImage {
        PickedImage::from_image(
            PathBuf::from("dog.jpg"),
            DynamicImage::ImageRgb8(RgbImage::new(width, width)),
            ImageOrientation::Up,
        )
    }

    #[test]
    fn test_run_cycle_info_before_detect() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let report = classify_now(7, &picked(4), &classifiers(&log)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["info", "detect"]);
        assert_eq!(report.cycle, 7);
        assert_eq!(report.image, PathBuf::from("dog.jpg"));
        assert_eq!(
            report.info,
            RequestOutcome::observations(vec![Observation::new("Dog", 0.9)])
        );
    }

    #[test]
    fn test_submission_failure_yields_no_report() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = classify_now(1, &picked(0), &classifiers(&log)).unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submit_delivers_joined_report() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new(classifiers(&log));

        let first = dispatcher.submit(&picked(4));
        let second = dispatcher.submit(&picked(4));
        assert_eq!(first.cycle + 1, second.cycle);

        let report = second.receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(report.cycle, second.cycle);
        assert!(!report.detect.is_failed());
    }

    #[test]
    fn test_submit_empty_image_disconnects() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new(classifiers(&log));

        let submission = dispatcher.submit(&picked(0));
        assert!(submission.receiver.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
