use std::path::Path;

use image::{GrayImage, ImageReader};
use imageproc::contrast::{threshold, ThresholdType};

use crate::config::TracingConfig;
use crate::error::TraceError;

/// Load an image and convert it to a binary (black/white) mask.
///
/// Pixels brighter than `config.threshold` become foreground (255), the rest
/// background (0). `config.invert` swaps the two.
pub fn load_and_threshold(path: &Path, config: &TracingConfig) -> Result<GrayImage, TraceError> {
    if !path.is_file() {
        return Err(TraceError::InvalidInputPath(path.to_path_buf()));
    }

    let img = ImageReader::open(path)
        .map_err(|e| TraceError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| TraceError::ImageLoad(e.to_string()))?
        .into_luma8();

    Ok(binarize(&img, config))
}

/// Threshold an already decoded grayscale image.
pub fn binarize(img: &GrayImage, config: &TracingConfig) -> GrayImage {
    let mut binary = threshold(img, config.threshold, ThresholdType::Binary);

    if config.invert {
        for pixel in binary.pixels_mut() {
            pixel.0[0] = 255 - pixel.0[0];
        }
    }

    binary
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn pixels_above_threshold_become_foreground() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(1, 0, Luma([128]));
        img.put_pixel(2, 0, Luma([200]));

        let config = TracingConfig {
            threshold: 128,
            ..TracingConfig::default()
        };
        let binary = binarize(&img, &config);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(1, 0).0[0], 0);
        assert_eq!(binary.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn invert_swaps_foreground() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(1, 0, Luma([255]));

        let config = TracingConfig {
            threshold: 128,
            invert: true,
            ..TracingConfig::default()
        };
        let binary = binarize(&img, &config);
        assert_eq!(binary.get_pixel(0, 0).0[0], 255);
        assert_eq!(binary.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn missing_file_is_reported_before_decoding() {
        let err = load_and_threshold(Path::new("does/not/exist.png"), &TracingConfig::default())
            .unwrap_err();
        assert!(matches!(err, TraceError::InvalidInputPath(_)));
    }
}
