//! Screen state shared by the GUI: preview, status label, cycle tracking

use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};

use animal_lens_types::{CycleReport, Result};
use animal_lens_vision::PickedImage;

use crate::dispatch::{Dispatcher, Submission};
use crate::format::{compose_message, FormatRules, CLASSIFYING};

/// Label text before the first pick
pub const INITIAL_PROMPT: &str = "Take or choose a photo";

/// The screen is either showing a previous result or waiting for one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Classifying { cycle: u64 },
}

/// Headless screen controller
pub struct ClassificationScreen {
    label: String,
    preview: Option<PickedImage>,
    phase: Phase,
    pending: Option<Receiver<CycleReport>>,
    last_report: Option<CycleReport>,
    rules: FormatRules,
}

impl ClassificationScreen {
    pub fn new(rules: FormatRules) -> Self {
        Self {
            label: INITIAL_PROMPT.to_string(),
            preview: None,
            phase: Phase::Idle,
            pending: None,
            last_report: None,
            rules,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn preview(&self) -> Option<&PickedImage> {
        self.preview.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_classifying(&self) -> bool {
        matches!(self.phase, Phase::Classifying { .. })
    }

    pub fn last_report(&self) -> Option<&CycleReport> {
        self.last_report.as_ref()
    }

    /// Decode a picked file, show it and submit it.
    ///
    /// A conversion failure is returned as a fatal error; the screen is left
    /// untouched in that case.
    pub fn pick(&mut self, path: &Path, dispatcher: &mut Dispatcher) -> Result<()> {
        let picked = PickedImage::open(path)?;
        let submission = dispatcher.submit(&picked);
        self.begin(picked, submission);
        Ok(())
    }

    /// Show a newly picked image and wait for its cycle.
    ///
    /// Any earlier in-flight cycle is superseded.
    pub fn begin(&mut self, picked: PickedImage, submission: Submission) {
        if let Phase::Classifying { cycle } = self.phase {
            tracing::debug!(superseded = cycle, by = submission.cycle, "new pick replaces in-flight cycle");
        }

        self.preview = Some(picked);
        self.label = CLASSIFYING.to_string();
        self.phase = Phase::Classifying {
            cycle: submission.cycle,
        };
        self.pending = Some(submission.receiver);
    }

    /// Check for a finished cycle. Returns true when the screen changed.
    pub fn poll(&mut self) -> bool {
        let Some(ref receiver) = self.pending else {
            return false;
        };

        match receiver.try_recv() {
            Ok(report) => {
                self.pending = None;
                self.apply(report)
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                // Submission failed; the label keeps its stale text
                tracing::warn!(phase = ?self.phase, "classification cycle ended without results");
                self.pending = None;
                self.phase = Phase::Idle;
                true
            }
        }
    }

    /// Apply a report if it answers the current cycle.
    pub fn apply(&mut self, report: CycleReport) -> bool {
        match self.phase {
            Phase::Classifying { cycle } if cycle == report.cycle => {
                self.label = compose_message(&report.info, &report.detect, &self.rules);
                tracing::info!(cycle, elapsed_ms = report.elapsed_ms, "classification displayed");
                self.phase = Phase::Idle;
                self.last_report = Some(report);
                true
            }
            _ => {
                tracing::debug!(stale = report.cycle, phase = ?self.phase, "ignoring stale report");
                false
            }
        }
    }
}
