//! Picked image: decoded bitmap plus its orientation tag
//!
//! A `PickedImage` lives for one classification cycle and is replaced
//! wholesale by the next pick.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use animal_lens_types::{Error, ImageOrientation, Result};
use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use crate::orientation::apply_orientation;

/// Image returned by a picker, ready for classification
#[derive(Debug, Clone)]
pub struct PickedImage {
    /// Where the image was picked from
    pub path: PathBuf,
    /// Pixels as stored in the file (orientation not yet applied)
    pub image: DynamicImage,
    /// Orientation tag read from EXIF
    pub orientation: ImageOrientation,
}

impl PickedImage {
    /// Decode an image file and read its orientation.
    ///
    /// A missing file is an ordinary error. A file that exists but cannot be
    /// decoded is a conversion failure, which callers treat as fatal.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        // The container is sniffed from content; extensions are often wrong
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| Error::Conversion {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let orientation = read_orientation(path);
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            orientation = ?orientation,
            "decoded picked image"
        );

        Ok(Self {
            path: path.to_path_buf(),
            image,
            orientation,
        })
    }

    /// Wrap an already-decoded image (camera frames, tests)
    pub fn from_image(path: PathBuf, image: DynamicImage, orientation: ImageOrientation) -> Self {
        Self {
            path,
            image,
            orientation,
        }
    }

    /// Pixels with the orientation applied
    pub fn upright(&self) -> DynamicImage {
        apply_orientation(&self.image, self.orientation)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Read the EXIF orientation tag, defaulting to upright when absent
pub fn read_orientation(path: &Path) -> ImageOrientation {
    let Ok(file) = File::open(path) else {
        return ImageOrientation::Up;
    };
    let mut bufreader = BufReader::new(file);
    let Ok(exif) = Reader::new().read_from_container(&mut bufreader) else {
        return ImageOrientation::Up;
    };

    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .map(ImageOrientation::from_exif)
        .unwrap_or_default()
}
