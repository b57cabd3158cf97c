//! Image pre-processing: crop/scale to the model input and tensor layout

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// How an arbitrary image is fitted into the square model input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropAndScale {
    /// Crop the largest centred square, then scale it
    #[default]
    CenterCrop,
    /// Scale preserving aspect ratio and pad the remainder with black
    ScaleFit,
    /// Scale to the input size ignoring aspect ratio
    ScaleFill,
}

impl std::fmt::Display for CropAndScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropAndScale::CenterCrop => write!(f, "center_crop"),
            CropAndScale::ScaleFit => write!(f, "scale_fit"),
            CropAndScale::ScaleFill => write!(f, "scale_fill"),
        }
    }
}

impl std::str::FromStr for CropAndScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "center_crop" | "centercrop" => Ok(CropAndScale::CenterCrop),
            "scale_fit" | "scalefit" => Ok(CropAndScale::ScaleFit),
            "scale_fill" | "scalefill" => Ok(CropAndScale::ScaleFill),
            other => Err(format!("unknown crop option: {other}")),
        }
    }
}

/// Produce a `size` x `size` RGB image according to `option`.
pub fn crop_and_scale(image: &DynamicImage, size: u32, option: CropAndScale) -> RgbImage {
    let (width, height) = (image.width(), image.height());

    match option {
        CropAndScale::CenterCrop => {
            let side = width.min(height);
            let x = (width - side) / 2;
            let y = (height - side) / 2;
            image
                .crop_imm(x, y, side, side)
                .resize_exact(size, size, FilterType::Triangle)
                .to_rgb8()
        }
        CropAndScale::ScaleFill => image.resize_exact(size, size, FilterType::Triangle).to_rgb8(),
        CropAndScale::ScaleFit => {
            let scaled = image.resize(size, size, FilterType::Triangle).to_rgb8();
            let mut canvas = RgbImage::new(size, size);
            let x = (size - scaled.width()) / 2;
            let y = (size - scaled.height()) / 2;
            imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
            canvas
        }
    }
}

/// Flatten an RGB image into NCHW order, normalised per channel.
pub fn to_nchw(image: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (x, y, pixel) in image.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for channel in 0..3 {
            let value = pixel.0[channel] as f32 / 255.0;
            data[channel * plane + offset] = (value - mean[channel]) / std[channel];
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// 30x10 image: left third red, middle third green, right third blue
    fn striped() -> DynamicImage {
        let img = RgbImage::from_fn(30, 10, |x, _| match x {
            0..=9 => Rgb([255, 0, 0]),
            10..=19 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_center_crop_keeps_middle() {
        let out = crop_and_scale(&striped(), 4, CropAndScale::CenterCrop);
        assert_eq!(out.dimensions(), (4, 4));
        for pixel in out.pixels() {
            assert_eq!(pixel.0, [0, 255, 0]);
        }
    }

    #[test]
    fn test_scale_fit_pads_with_black() {
        let out = crop_and_scale(&striped(), 6, CropAndScale::ScaleFit);
        assert_eq!(out.dimensions(), (6, 6));
        // 30x10 scales to 6x2, centred vertically with black above
        assert_eq!(out.get_pixel(3, 0).0, [0, 0, 0]);
        assert_ne!(out.get_pixel(3, 2).0, [0, 0, 0]);
    }

    #[test]
    fn test_scale_fill_stretches() {
        let out = crop_and_scale(&striped(), 6, CropAndScale::ScaleFill);
        assert_eq!(out.dimensions(), (6, 6));
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(5, 5).0[2], 255);
    }

    #[test]
    fn test_to_nchw_layout_and_normalisation() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));

        let data = to_nchw(&img, [0.0; 3], [1.0; 3]);
        assert_eq!(data, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);

        let data = to_nchw(&img, [0.5; 3], [0.5; 3]);
        assert_eq!(data[0], 1.0);
        assert_eq!(data[1], -1.0);
    }

    #[test]
    fn test_crop_option_parsing() {
        assert_eq!("center-crop".parse::<CropAndScale>(), Ok(CropAndScale::CenterCrop));
        assert_eq!("scale_fit".parse::<CropAndScale>(), Ok(CropAndScale::ScaleFit));
        assert!("zoom".parse::<CropAndScale>().is_err());
    }
}
