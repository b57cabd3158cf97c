//! Batch classification of many images with a worker pool

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use animal_lens_types::CycleReport;
use animal_lens_vision::PickedImage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::classify_now;
use crate::format::{compose_message, FormatRules};
use crate::models::Classifiers;

/// Outcome for one image of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub image: PathBuf,
    /// Label text, as the screen would show it
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub report: Option<CycleReport>,
    /// Why the image produced no report
    #[serde(default)]
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of a whole batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub entries: Vec<BatchEntry>,
}

/// Classify one image without aborting on bad input
pub fn classify_entry(
    index: usize,
    image: &Path,
    classifiers: &Classifiers,
    rules: &FormatRules,
) -> BatchEntry {
    let result = PickedImage::open(image)
        .and_then(|picked| classify_now(index as u64 + 1, &picked, classifiers));

    match result {
        Ok(report) => BatchEntry {
            image: image.to_path_buf(),
            message: Some(compose_message(&report.info, &report.detect, rules)),
            report: Some(report),
            error: None,
        },
        Err(e) => {
            tracing::warn!(image = %image.display(), error = %e, "batch item failed");
            BatchEntry {
                image: image.to_path_buf(),
                message: None,
                report: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Classify `images` with `jobs` worker threads.
///
/// `on_done` is called once per image as it finishes. Entries come back in
/// input order.
pub fn run_batch(
    images: &[PathBuf],
    classifiers: &Classifiers,
    rules: &FormatRules,
    jobs: usize,
    on_done: &(dyn Fn(&BatchEntry) + Sync),
) -> BatchSummary {
    let started_at = Utc::now();
    let jobs = jobs.clamp(1, images.len().max(1));
    let next_index = AtomicUsize::new(0);

    let mut indexed: Vec<(usize, BatchEntry)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..jobs)
            .map(|worker_id| {
                let next_index = &next_index;
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let idx = next_index.fetch_add(1, Ordering::SeqCst);
                        if idx >= images.len() {
                            break;
                        }
                        tracing::debug!(worker_id, image = %images[idx].display(), "classifying");
                        let entry = classify_entry(idx, &images[idx], classifiers, rules);
                        on_done(&entry);
                        done.push((idx, entry));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| match handle.join() {
                Ok(done) => Some(done),
                Err(_) => {
                    tracing::error!("batch worker panicked");
                    None
                }
            })
            .flatten()
            .collect()
    });

    indexed.sort_by_key(|(idx, _)| *idx);
    let entries: Vec<BatchEntry> = indexed.into_iter().map(|(_, entry)| entry).collect();
    let successful = entries.iter().filter(|e| e.is_success()).count();

    BatchSummary {
        started_at,
        completed_at: Utc::now(),
        total: images.len(),
        successful,
        failed: images.len() - successful,
        entries,
    }
}
