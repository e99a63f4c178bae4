//! Grayscale filtering primitives used by the preprocessing recipes.
//!
//! Gaussian blur and rotation come from `imageproc`; CLAHE and the Gaussian
//! adaptive threshold are written here against `GrayImage` with
//! OpenCV-compatible parameters.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

// ── Statistics ───────────────────────────────────────────────────────────────

/// Population mean and standard deviation of pixel intensities.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GrayStats {
    pub mean: f64,
    pub std_dev: f64,
}

pub fn gray_stats(img: &GrayImage) -> GrayStats {
    let (sum, sum_sq, count) = img.pixels().fold((0.0f64, 0.0f64, 0u64), |(s, sq, n), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v, n + 1)
    });
    if count == 0 {
        return GrayStats { mean: 0.0, std_dev: 0.0 };
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64) - mean * mean;
    GrayStats { mean, std_dev: variance.max(0.0).sqrt() }
}

// ── Smoothing ────────────────────────────────────────────────────────────────

/// Sigma OpenCV derives for a square Gaussian kernel when none is given.
pub fn kernel_sigma(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_blur(img: &GrayImage, ksize: u32) -> GrayImage {
    gaussian_blur_f32(img, kernel_sigma(ksize))
}

// ── Contrast ─────────────────────────────────────────────────────────────────

/// Contrast-limited adaptive histogram equalization over a `grid`×`grid`
/// tiling, with bilinear blending between neighbouring tile mappings.
pub fn clahe(img: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let grid = grid.max(1);
    let tile_w = w.div_ceil(grid.min(w));
    let tile_h = h.div_ceil(grid.min(h));
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, y0) = (tx * tile_w, ty * tile_h);
            let (x1, y1) = ((x0 + tile_w).min(w), (y0 + tile_h).min(h));
            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            luts.push(clipped_lut(&hist, (x1 - x0) * (y1 - y0), clip_limit));
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let (ty0, ty1, wy) = tile_neighbours(y, tile_h, tiles_y);
        let (tx0, tx1, wx) = tile_neighbours(x, tile_w, tiles_x);
        let v = img.get_pixel(x, y)[0] as usize;
        let at = |tx: usize, ty: usize| luts[ty * tiles_x as usize + tx][v] as f32;
        let top = at(tx0, ty0) * (1.0 - wx) + at(tx1, ty0) * wx;
        let bottom = at(tx0, ty1) * (1.0 - wx) + at(tx1, ty1) * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8])
    })
}

/// Equalization mapping for one tile after clipping its histogram and
/// spreading the excess evenly over all bins.
fn clipped_lut(hist: &[u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut hist = *hist;
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let bonus = excess / 256;
    let residual = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += bonus + u32::from(i < residual);
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[i] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Neighbouring tile indices along one axis and the blend weight of the
/// second one. Pixels outside the outer tile centres use a single tile.
fn tile_neighbours(pos: u32, tile: u32, count: u32) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let lo = f.floor() as u32;
    if lo >= count - 1 {
        let last = (count - 1) as usize;
        return (last, last, 0.0);
    }
    (lo as usize, lo as usize + 1, f - lo as f32)
}

// ── Binarization ─────────────────────────────────────────────────────────────

/// Gaussian adaptive threshold: a pixel turns white when it is brighter than
/// its Gaussian-weighted neighbourhood mean minus `c`.
pub fn adaptive_gaussian_threshold(img: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let local = gaussian_blur_f32(img, kernel_sigma(block_size));
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y)[0] as f32;
        let threshold = local.get_pixel(x, y)[0] as f32 - c;
        Luma([if v > threshold { 255 } else { 0 }])
    })
}

// ── Deskew ───────────────────────────────────────────────────────────────────

const INK_THRESHOLD: u8 = 128;
const MIN_INK_RATIO: f32 = 0.02;
const SKEW_SEARCH_DEGREES: f32 = 5.0;
const SKEW_STEP_DEGREES: f32 = 0.25;
const MIN_SKEW_DEGREES: f32 = 0.5;

/// Estimate the slope of text rows, in degrees (positive when rows descend to
/// the right). Returns `None` for small or nearly blank images, or when the
/// best angle is below half a degree.
pub fn detect_skew_angle(img: &GrayImage) -> Option<f32> {
    let (w, h) = img.dimensions();
    if w < 50 || h < 50 {
        return None;
    }
    let ink: Vec<(u32, u32)> = img
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] < INK_THRESHOLD)
        .map(|(x, y, _)| (x, y))
        .collect();
    if (ink.len() as f32) < (w as f32 * h as f32) * MIN_INK_RATIO {
        return None;
    }

    let steps = (2.0 * SKEW_SEARCH_DEGREES / SKEW_STEP_DEGREES).round() as i32;
    let mut best_angle = 0.0f32;
    let mut best_score = f64::NEG_INFINITY;
    for i in 0..=steps {
        let angle = -SKEW_SEARCH_DEGREES + i as f32 * SKEW_STEP_DEGREES;
        let score = row_profile_score(&ink, w, h, angle);
        if score > best_score {
            best_score = score;
            best_angle = angle;
        }
    }

    (best_angle.abs() >= MIN_SKEW_DEGREES).then_some(best_angle)
}

/// Sharpness of the row histogram after undoing a slope of `angle_deg`.
fn row_profile_score(ink: &[(u32, u32)], w: u32, h: u32, angle_deg: f32) -> f64 {
    let tan = (angle_deg as f64).to_radians().tan();
    let margin = (w as f64 * SKEW_SEARCH_DEGREES.to_radians().tan() as f64).ceil() as i64 + 1;
    let mut rows = vec![0u32; (h as i64 + 2 * margin) as usize];
    for &(x, y) in ink {
        let row = (y as f64 - x as f64 * tan).round() as i64 + margin;
        if row >= 0 && (row as usize) < rows.len() {
            rows[row as usize] += 1;
        }
    }
    rows.windows(2)
        .map(|pair| {
            let diff = pair[1] as f64 - pair[0] as f64;
            diff * diff
        })
        .sum()
}

/// Rotate so rows with slope `angle_deg` become horizontal. Uncovered
/// corners are filled with white paper.
pub fn deskew(img: &GrayImage, angle_deg: f32) -> GrayImage {
    rotate_about_center(img, -angle_deg.to_radians(), Interpolation::Bilinear, Luma([255u8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, v: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([v]))
    }

    /// White page with dark 2px rows every 10px, sloped by `angle_deg`.
    fn sloped_rows(w: u32, h: u32, angle_deg: f32) -> GrayImage {
        let tan = angle_deg.to_radians().tan();
        GrayImage::from_fn(w, h, |x, y| {
            let base = y as f32 - x as f32 * tan;
            let phase = base.rem_euclid(10.0);
            Luma([if phase < 2.0 { 0 } else { 255 }])
        })
    }

    #[test]
    fn stats_of_two_tone_image() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 108 } else { 148 }]));
        let stats = gray_stats(&img);
        assert!((stats.mean - 128.0).abs() < 1e-9);
        assert!((stats.std_dev - 20.0).abs() < 1e-9);
    }

    #[test]
    fn stats_of_empty_image_are_zero() {
        let stats = gray_stats(&GrayImage::new(0, 0));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn kernel_sigma_matches_opencv_defaults() {
        assert!((kernel_sigma(3) - 0.8).abs() < 1e-6);
        assert!((kernel_sigma(5) - 1.1).abs() < 1e-6);
        assert!((kernel_sigma(31) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn clipped_lut_is_monotonic_and_reaches_white() {
        let mut hist = [0u32; 256];
        hist[40] = 500;
        hist[41] = 524;
        let lut = clipped_lut(&hist, 1024, 2.0);
        assert!(lut.windows(2).all(|p| p[0] <= p[1]));
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn clahe_single_tile_without_clipping_is_global_equalization() {
        let img = GrayImage::from_fn(16, 16, |x, _| Luma([if x < 8 { 0 } else { 200 }]));
        let out = clahe(&img, 256.0, 1);
        assert_eq!(out.get_pixel(0, 0)[0], 128);
        assert_eq!(out.get_pixel(15, 15)[0], 255);
    }

    #[test]
    fn clahe_uniform_input_gives_uniform_output() {
        let out = clahe(&solid(64, 48, 100), 2.0, 8);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn clahe_handles_images_smaller_than_grid() {
        let out = clahe(&solid(3, 5, 10), 2.0, 8);
        assert_eq!(out.dimensions(), (3, 5));
    }

    #[test]
    fn adaptive_threshold_uniform_is_white() {
        let out = adaptive_gaussian_threshold(&solid(40, 40, 120), 31, 5.0);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn adaptive_threshold_marks_dark_strokes_black() {
        let img = GrayImage::from_fn(60, 60, |x, _| Luma([if (28..32).contains(&x) { 30 } else { 200 }]));
        let out = adaptive_gaussian_threshold(&img, 31, 5.0);
        assert_eq!(out.get_pixel(30, 30)[0], 0);
        assert_eq!(out.get_pixel(5, 30)[0], 255);
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn detects_slope_of_ruled_rows() {
        let img = sloped_rows(200, 200, 3.0);
        let angle = detect_skew_angle(&img).expect("skew should be found");
        assert!((angle - 3.0).abs() <= 0.5, "angle was {angle}");
    }

    #[test]
    fn straight_rows_report_no_skew() {
        assert_eq!(detect_skew_angle(&sloped_rows(200, 200, 0.0)), None);
    }

    #[test]
    fn blank_or_tiny_pages_report_no_skew() {
        assert_eq!(detect_skew_angle(&solid(200, 200, 255)), None);
        assert_eq!(detect_skew_angle(&solid(20, 20, 0)), None);
    }

    #[test]
    fn deskew_keeps_dimensions() {
        let out = deskew(&sloped_rows(120, 80, 2.0), 2.0);
        assert_eq!(out.dimensions(), (120, 80));
    }
}
