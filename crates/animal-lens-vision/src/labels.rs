//! Class label files: one label per line, in model output order

use animal_lens_types::{Error, Result};
use std::path::Path;

/// Parse label file content. Blank lines are skipped.
pub fn parse_labels(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load labels from a file
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::Labels(format!(
            "labels file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let labels = parse_labels(&content);

    if labels.is_empty() {
        return Err(Error::Labels(format!(
            "labels file is empty: {}",
            path.display()
        )));
    }

    Ok(labels)
}
