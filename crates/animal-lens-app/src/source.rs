//! Image source selection and camera capture
//!
//! The camera is an external command configured by the user, for example
//! `fswebcam --no-banner {output}` or `libcamera-still -o {output}`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use animal_lens_types::{Error, ImageSource, Result};
use chrono::Utc;

/// Replaced with the capture target path in the configured command
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Entries of the source-choice dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAction {
    TakePhoto,
    ChoosePhoto,
    Cancel,
}

impl SourceAction {
    pub fn title(&self) -> &'static str {
        match self {
            SourceAction::TakePhoto => "Take Photo",
            SourceAction::ChoosePhoto => "Choose Photo",
            SourceAction::Cancel => "Cancel",
        }
    }

    /// Source the action opens; `None` for cancel
    pub fn source(&self) -> Option<ImageSource> {
        match self {
            SourceAction::TakePhoto => Some(ImageSource::Camera),
            SourceAction::ChoosePhoto => Some(ImageSource::Library),
            SourceAction::Cancel => None,
        }
    }
}

/// What happens when the user asks for a picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerPlan {
    /// Open this picker straight away
    Direct(ImageSource),
    /// Let the user choose first
    Choice(Vec<SourceAction>),
}

pub fn plan_picker(camera_available: bool) -> PickerPlan {
    if camera_available {
        PickerPlan::Choice(vec![
            SourceAction::TakePhoto,
            SourceAction::ChoosePhoto,
            SourceAction::Cancel,
        ])
    } else {
        PickerPlan::Direct(ImageSource::Library)
    }
}

/// Build the argument vector for a capture command template.
///
/// Every `{output}` is replaced with the target path; without a
/// placeholder the path is appended as the last argument.
pub fn build_capture_command(template: &str, output: &Path) -> Result<Vec<String>> {
    let mut parts = shell_words::split(template)
        .map_err(|e| Error::Capture(format!("invalid capture command {template:?}: {e}")))?;

    if parts.is_empty() {
        return Err(Error::Capture("capture command is empty".to_string()));
    }

    let output = output.display().to_string();
    if parts.iter().any(|p| p.contains(OUTPUT_PLACEHOLDER)) {
        for part in parts.iter_mut() {
            *part = part.replace(OUTPUT_PLACEHOLDER, &output);
        }
    } else {
        parts.push(output);
    }

    Ok(parts)
}

/// Camera backed by an external capture command
#[derive(Debug, Clone)]
pub struct CaptureDevice {
    command: Option<String>,
    output_dir: PathBuf,
}

impl CaptureDevice {
    pub fn new(command: Option<String>, output_dir: PathBuf) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
            output_dir,
        }
    }

    /// Capture into the system temp directory
    pub fn from_command(command: Option<String>) -> Self {
        Self::new(command, std::env::temp_dir().join("animal-lens"))
    }

    /// True when a usable capture command is configured
    pub fn is_available(&self) -> bool {
        self.command
            .as_deref()
            .map(|c| build_capture_command(c, &self.output_dir).is_ok())
            .unwrap_or(false)
    }

    fn next_output_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "capture_{}_{}.jpg",
            std::process::id(),
            Utc::now().timestamp_millis()
        ))
    }

    /// Take a photo.
    ///
    /// Returns `Ok(None)` when the command exits unsuccessfully or writes no
    /// file, which is treated like a cancelled picker.
    pub fn capture(&self) -> Result<Option<PathBuf>> {
        let template = self
            .command
            .as_deref()
            .ok_or_else(|| Error::Capture("no capture command configured".to_string()))?;

        std::fs::create_dir_all(&self.output_dir)?;
        let output_path = self.next_output_path();
        let mut parts = build_capture_command(template, &output_path)?;
        let program = parts.remove(0);

        tracing::debug!(program = %program, args = ?parts, "running capture command");

        let output = Command::new(&program)
            .args(&parts)
            .output()
            .map_err(|e| Error::Capture(format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::info!(status = %output.status, stderr = %stderr.trim(), "capture cancelled");
            return Ok(None);
        }

        if !output_path.exists() {
            tracing::info!(path = %output_path.display(), "capture produced no file");
            return Ok(None);
        }

        Ok(Some(output_path))
    }

    /// Run `capture` on a background thread so a slow camera tool does not
    /// stall the caller.
    pub fn capture_in_background(&self) -> PendingCapture {
        let (sender, receiver) = channel();
        let device = self.clone();

        let spawned = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                // The caller may have given up on this capture
                let _ = sender.send(device.capture());
            });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to start capture thread");
        }

        PendingCapture { receiver }
    }
}

/// A capture running on a background thread
#[derive(Debug)]
pub struct PendingCapture {
    receiver: Receiver<Result<Option<PathBuf>>>,
}

impl PendingCapture {
    /// Result of the capture, or `None` while the command is still running
    pub fn poll(&self) -> Option<Result<Option<PathBuf>>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(Error::Capture(
                "capture thread ended without a result".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_without_camera_goes_to_library() {
        assert_eq!(plan_picker(false), PickerPlan::Direct(ImageSource::Library));
    }

    #[test]
    fn test_plan_with_camera_offers_choice() {
        let PickerPlan::Choice(actions) = plan_picker(true) else {
            panic!("expected a choice");
        };
        let titles: Vec<&str> = actions.iter().map(|a| a.title()).collect();
        assert_eq!(titles, vec!["Take Photo", "Choose Photo", "Cancel"]);
        assert_eq!(actions[0].source(), Some(ImageSource::Camera));
        assert_eq!(actions[1].source(), Some(ImageSource::Library));
        assert_eq!(actions[2].source(), None);
    }

    #[test]
    fn test_build_command_replaces_placeholder() {
        let parts =
            build_capture_command("fswebcam --no-banner -r '640x480' {output}", Path::new("/tmp/a.jpg"))
                .unwrap();
        assert_eq!(parts, vec!["fswebcam", "--no-banner", "-r", "640x480", "/tmp/a.jpg"]);
    }

    #[test]
    fn test_build_command_appends_without_placeholder() {
        let parts = build_capture_command("snap -q", Path::new("/tmp/b.jpg")).unwrap();
        assert_eq!(parts, vec!["snap", "-q", "/tmp/b.jpg"]);
    }

    #[test]
    fn test_build_command_rejects_bad_quoting() {
        assert!(build_capture_command("snap 'unterminated", Path::new("/tmp/c.jpg")).is_err());
        assert!(build_capture_command("   ", Path::new("/tmp/c.jpg")).is_err());
    }

    #[test]
    fn test_availability() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!CaptureDevice::new(None, dir.path().to_path_buf()).is_available());
        assert!(!CaptureDevice::new(Some("  ".to_string()), dir.path().to_path_buf()).is_available());
        assert!(CaptureDevice::new(Some("snap {output}".to_string()), dir.path().to_path_buf()).is_available());
    }

    #[test]
    fn test_capture_without_command_errors() {
        let dir = tempfile::tempdir().unwrap();
        let device = CaptureDevice::new(None, dir.path().to_path_buf());
        assert!(matches!(device.capture(), Err(Error::Capture(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_failure_is_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let device = CaptureDevice::new(Some("false".to_string()), dir.path().to_path_buf());
        assert_eq!(device.capture().unwrap(), None);
    }

    fn wait_for(pending: &PendingCapture) -> Result<Option<PathBuf>> {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        loop {
            if let Some(result) = pending.poll() {
                return result;
            }
            assert!(std::time::Instant::now() < deadline, "capture did not finish");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    #[test]
    fn test_background_capture_without_command_errors() {
        let dir = tempfile::tempdir().unwrap();
        let device = CaptureDevice::new(None, dir.path().to_path_buf());
        assert!(matches!(wait_for(&device.capture_in_background()), Err(Error::Capture(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_background_capture_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let device = CaptureDevice::new(
            Some("sh -c 'sleep 0.3 && touch \"$0\"' {output}".to_string()),
            dir.path().to_path_buf(),
        );

        let started = std::time::Instant::now();
        let pending = device.capture_in_background();
        assert!(started.elapsed() < std::time::Duration::from_millis(250));
        assert!(pending.poll().is_none());

        let path = wait_for(&pending).unwrap().expect("file should be captured");
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_background_capture_failure_is_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let device = CaptureDevice::new(Some("false".to_string()), dir.path().to_path_buf());
        assert_eq!(wait_for(&device.capture_in_background()).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_returns_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let device = CaptureDevice::new(Some("touch {output}".to_string()), dir.path().to_path_buf());
        let path = device.capture().unwrap().expect("file should be captured");
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
    }
}
