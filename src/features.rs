//! Feature vectors from images.
//!
//! Two extractors, both producing fixed-length `Vec<f32>` rows:
//!
//! - [`average_hash`]: 8x8 grayscale thumbnail thresholded at its mean,
//!   64 binary components. Pairs naturally with
//!   [`Metric::Hamming`](crate::cluster::Metric::Hamming).
//! - [`pixel_features`]: RGB thumbnail flattened to `side * side * 3`
//!   components scaled to `[0, 1]`.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Side of the average-hash thumbnail.
pub const HASH_SIDE: u32 = 8;

/// Which feature vector to compute per image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureKind {
    /// 64-bit average hash.
    #[default]
    AverageHash,
    /// Downsampled pixels on a `side x side` grid.
    Pixels {
        /// Thumbnail side length.
        side: u32,
    },
}

impl FeatureKind {
    /// Compute the feature vector for `image`.
    pub fn extract(self, image: &RgbImage) -> Vec<f32> {
        match self {
            Self::AverageHash => average_hash(image),
            Self::Pixels { side } => pixel_features(image, side),
        }
    }

    /// Number of components per vector.
    pub fn dim(self) -> usize {
        match self {
            Self::AverageHash => (HASH_SIDE * HASH_SIDE) as usize,
            Self::Pixels { side } => (side * side * 3) as usize,
        }
    }
}

/// Average hash: `1.0` where the thumbnail is brighter than its mean.
pub fn average_hash(image: &RgbImage) -> Vec<f32> {
    let gray = imageops::grayscale(image);
    let thumb = imageops::resize(&gray, HASH_SIDE, HASH_SIDE, FilterType::Lanczos3);
    let values: Vec<f32> = thumb.pixels().map(|p| f32::from(p.0[0])).collect();
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values
        .into_iter()
        .map(|v| if v > mean { 1.0 } else { 0.0 })
        .collect()
}

/// Row-major RGB thumbnail, components scaled to `[0, 1]`.
pub fn pixel_features(image: &RgbImage, side: u32) -> Vec<f32> {
    let side = side.max(1);
    let thumb = imageops::resize(image, side, side, FilterType::Triangle);
    thumb
        .into_raw()
        .into_iter()
        .map(|c| f32::from(c) / 255.0)
        .collect()
}
