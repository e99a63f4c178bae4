use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::PreprocessConfig;
use crate::filters::{self, GrayStats};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to decode image bytes: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to create output directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to save processed image {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

// ── Recipes ──────────────────────────────────────────────────────────────────

pub const LIGHT_MAX_STD: f64 = 30.0;
pub const MEDIUM_MAX_STD: f64 = 55.0;

const CLAHE_GRID: u32 = 8;
/// Window side, OpenCV diameter 5.
const LIGHT_BILATERAL_WINDOW: u32 = 5;
const LIGHT_SIGMA_COLOR: f32 = 50.0;
const LIGHT_SIGMA_SPACE: f32 = 50.0;
const LIGHT_CLAHE_CLIP: f32 = 1.8;
const MEDIUM_BLUR_KERNEL: u32 = 3;
const MEDIUM_CLAHE_CLIP: f32 = 2.5;
const HEAVY_BLUR_KERNEL: u32 = 5;
const HEAVY_THRESHOLD_BLOCK: u32 = 31;
const HEAVY_THRESHOLD_C: f32 = 5.0;

/// Filtering recipe chosen per image from its contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipe {
    /// Faint scans: bilateral smoothing + gentle CLAHE.
    Light,
    /// Mid contrast: small blur + stronger CLAHE.
    Medium,
    /// High contrast or shadows: blur + adaptive binarization.
    Heavy,
}

impl Recipe {
    pub fn apply(self, gray: &GrayImage) -> GrayImage {
        match self {
            Recipe::Light => {
                let smoothed = imageproc::filter::bilateral_filter(
                    gray,
                    LIGHT_BILATERAL_WINDOW,
                    LIGHT_SIGMA_COLOR,
                    LIGHT_SIGMA_SPACE,
                );
                filters::clahe(&smoothed, LIGHT_CLAHE_CLIP, CLAHE_GRID)
            }
            Recipe::Medium => {
                let blurred = filters::gaussian_blur(gray, MEDIUM_BLUR_KERNEL);
                filters::clahe(&blurred, MEDIUM_CLAHE_CLIP, CLAHE_GRID)
            }
            Recipe::Heavy => {
                let blurred = filters::gaussian_blur(gray, HEAVY_BLUR_KERNEL);
                filters::adaptive_gaussian_threshold(&blurred, HEAVY_THRESHOLD_BLOCK, HEAVY_THRESHOLD_C)
            }
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipe::Light => write!(f, "light"),
            Recipe::Medium => write!(f, "medium"),
            Recipe::Heavy => write!(f, "heavy"),
        }
    }
}

/// Thresholds that map grayscale statistics to a [`Recipe`].
///
/// `std_dev < light_max_std` is light, `light_max_std..=medium_max_std` is
/// medium, anything above is heavy. When `washed_out_mean` is set, a brighter
/// mean forces heavy regardless of spread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecipePolicy {
    pub light_max_std: f64,
    pub medium_max_std: f64,
    pub washed_out_mean: Option<f64>,
}

impl Default for RecipePolicy {
    fn default() -> Self {
        Self { light_max_std: LIGHT_MAX_STD, medium_max_std: MEDIUM_MAX_STD, washed_out_mean: None }
    }
}

impl RecipePolicy {
    pub fn select(&self, stats: &GrayStats) -> Recipe {
        if self.washed_out_mean.is_some_and(|limit| stats.mean > limit) {
            return Recipe::Heavy;
        }
        if stats.std_dev < self.light_max_std {
            Recipe::Light
        } else if stats.std_dev <= self.medium_max_std {
            Recipe::Medium
        } else {
            Recipe::Heavy
        }
    }
}

// ── Normalizer ───────────────────────────────────────────────────────────────

/// A single-channel image ready for recognition, plus how it was produced.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub image: GrayImage,
    pub recipe: Recipe,
    /// Statistics of the grayscale input the recipe was chosen from.
    pub stats: GrayStats,
    /// Rotation that was undone, when deskew is enabled and found one.
    pub skew_degrees: Option<f32>,
}

pub struct Normalizer {
    config: PreprocessConfig,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Load an image file and run the selected recipe over it.
    pub fn normalize(&self, path: &Path) -> Result<NormalizedImage, PreprocessError> {
        Ok(self.normalize_image(load(path)?))
    }

    /// Same as [`normalize`](Self::normalize) for in-memory JPEG / PNG / … bytes.
    pub fn normalize_bytes(&self, data: &[u8]) -> Result<NormalizedImage, PreprocessError> {
        let img = image::load_from_memory(data)?;
        Ok(self.normalize_image(img))
    }

    pub fn normalize_image(&self, img: DynamicImage) -> NormalizedImage {
        let (gray, skew_degrees) = self.prepare(img);
        let stats = filters::gray_stats(&gray);
        let recipe = self.config.policy().select(&stats);
        tracing::debug!(
            mean = stats.mean,
            std_dev = stats.std_dev,
            %recipe,
            "Selected preprocessing recipe"
        );
        NormalizedImage { image: recipe.apply(&gray), recipe, stats, skew_degrees }
    }

    /// Measure an image and report the recipe it would get, without filtering.
    pub fn classify(&self, path: &Path) -> Result<(GrayStats, Recipe), PreprocessError> {
        let (gray, _) = self.prepare(load(path)?);
        let stats = filters::gray_stats(&gray);
        Ok((stats, self.config.policy().select(&stats)))
    }

    /// Normalize `src` and write the result to `dest`, creating parent
    /// directories. The format follows `dest`'s extension.
    pub fn save_preprocessed(&self, src: &Path, dest: &Path) -> Result<NormalizedImage, PreprocessError> {
        let normalized = self.normalize(src)?;
        write_image(&normalized, dest)?;
        Ok(normalized)
    }

    /// Downscale, convert to grayscale and optionally deskew.
    fn prepare(&self, img: DynamicImage) -> (GrayImage, Option<f32>) {
        // Very large scans are slow to filter and don't recognize any better.
        let max = self.config.max_dimension;
        let img = if max > 0 && (img.width() > max || img.height() > max) {
            img.resize(max, max, image::imageops::FilterType::Lanczos3)
        } else {
            img
        };

        let gray = img.to_luma8();
        if !self.config.deskew {
            return (gray, None);
        }
        match filters::detect_skew_angle(&gray) {
            Some(angle) => {
                tracing::debug!(angle, "Correcting skew");
                (filters::deskew(&gray, angle), Some(angle))
            }
            None => (gray, None),
        }
    }
}

fn load(path: &Path) -> Result<DynamicImage, PreprocessError> {
    image::open(path).map_err(|source| PreprocessError::Load { path: path.to_path_buf(), source })
}

/// Persist a normalized image, creating parent directories as needed.
pub fn write_image(normalized: &NormalizedImage, dest: &Path) -> Result<(), PreprocessError> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    normalized
        .image
        .save(dest)
        .map_err(|source| PreprocessError::Save { path: dest.to_path_buf(), source })
}
