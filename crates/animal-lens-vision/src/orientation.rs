//! Apply an EXIF orientation tag to pixel data

use animal_lens_types::ImageOrientation;
use image::DynamicImage;

/// Return a copy of `image` transformed so it appears upright.
pub fn apply_orientation(image: &DynamicImage, orientation: ImageOrientation) -> DynamicImage {
    match orientation {
        ImageOrientation::Up => image.clone(),
        ImageOrientation::UpMirrored => image.fliph(),
        ImageOrientation::Down => image.rotate180(),
        ImageOrientation::DownMirrored => image.flipv(),
        ImageOrientation::LeftMirrored => image.rotate90().fliph(),
        ImageOrientation::Right => image.rotate90(),
        ImageOrientation::RightMirrored => image.rotate270().fliph(),
        ImageOrientation::Left => image.rotate270(),
    }
}
