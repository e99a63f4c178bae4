use anyhow::{bail, Context};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use recto_ocr::config::OcrConfig;
use recto_ocr::recognizer::{self, TextRecognizer};
use recto_ocr::{ExtractedFields, Extractor, GrayStats, Normalizer, ReceiptPipeline, Recipe, RectoConfig};

/// No path means built-in defaults; a path that can't be read is an error.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RectoConfig> {
    match path {
        Some(path) => RectoConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(RectoConfig::default()),
    }
}

// ── scan ──────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ScanOutput<'a> {
    path: &'a Path,
    recipe: Recipe,
    fields: &'a ExtractedFields,
}

pub fn scan(config: &RectoConfig, images: &[PathBuf], save_dir: Option<&Path>) -> anyhow::Result<()> {
    recognizer::install_shared(build_recognizer(&config.ocr))?;
    let pipeline = ReceiptPipeline::new(recognizer::shared()?, Normalizer::new(config.preprocess.clone()));

    let save_paths = save_dir.map(|dir| preprocessed_paths(dir, images));

    let mut failed = 0usize;
    for (i, path) in images.iter().enumerate() {
        let save_to = save_paths.as_ref().map(|paths| paths[i].as_path());
        match pipeline.process_file(path, save_to) {
            Ok(result) => {
                let out = ScanOutput { path, recipe: result.recipe, fields: &result.fields };
                println!("{}", serde_json::to_string(&out)?);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Scan failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} images failed", images.len());
    }
    Ok(())
}

/// `<dir>/<stem>.png` per input, so the saved copy is lossless whatever the
/// input format. Repeated stems get `-2`, `-3`, … in input order.
fn preprocessed_paths(dir: &Path, images: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    images
        .iter()
        .map(|src| {
            let stem = src.file_stem().map_or("receipt".into(), |s| s.to_string_lossy());
            let mut name = format!("{stem}.png");
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{stem}-{n}.png");
            }
            dir.join(name)
        })
        .collect()
}

#[cfg(feature = "tesseract")]
fn build_recognizer(config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    use recto_ocr::recognizer::tesseract_backend::TesseractRecognizer;

    let data_path = config.tessdata.as_ref().map(|p| p.to_string_lossy().into_owned());
    Arc::new(TesseractRecognizer::new(data_path, &config.language))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    tracing::warn!("Built without the `tesseract` feature; recognition will fail");
    Arc::new(recto_ocr::UnavailableRecognizer)
}

// ── extract / preprocess / classify ──────────────────────────────────────────

pub fn extract_transcript(path: &Path) -> anyhow::Result<ExtractedFields> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Extractor::extract_text(&text))
}

#[derive(Serialize)]
struct ImageReport {
    recipe: Recipe,
    mean: f64,
    std_dev: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    skew_degrees: Option<f32>,
}

impl ImageReport {
    fn new(recipe: Recipe, stats: GrayStats, skew_degrees: Option<f32>) -> Self {
        Self { recipe, mean: stats.mean, std_dev: stats.std_dev, skew_degrees }
    }
}

pub fn preprocess(config: &RectoConfig, src: &Path, dest: &Path) -> anyhow::Result<()> {
    let normalized = Normalizer::new(config.preprocess.clone()).save_preprocessed(src, dest)?;
    tracing::info!(dest = %dest.display(), recipe = %normalized.recipe, "Wrote preprocessed image");
    let report = ImageReport::new(normalized.recipe, normalized.stats, normalized.skew_degrees);
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

pub fn classify(config: &RectoConfig, image: &Path) -> anyhow::Result<()> {
    let (stats, recipe) = Normalizer::new(config.preprocess.clone()).classify(image)?;
    println!("{}", serde_json::to_string(&ImageReport::new(recipe, stats, None))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};
    use recto_core::Amount;

    fn write_two_tone(path: &Path) {
        let img: GrayImage = ImageBuffer::from_fn(64, 64, |x, _| Luma([if x < 32 { 48u8 } else { 208 }]));
        img.save(path).unwrap();
    }

    #[test]
    fn preprocessed_paths_use_stem_and_png() {
        let paths = preprocessed_paths(
            Path::new("out"),
            &[PathBuf::from("scans/r1.jpg"), PathBuf::from("noext"), PathBuf::from("scan.v2.jpg")],
        );
        assert_eq!(
            paths,
            [
                PathBuf::from("out/r1.png"),
                PathBuf::from("out/noext.png"),
                PathBuf::from("out/scan.v2.png"),
            ]
        );
    }

    #[test]
    fn same_stem_inputs_get_distinct_destinations() {
        let paths = preprocessed_paths(
            Path::new("out"),
            &[
                PathBuf::from("store1/receipt.jpg"),
                PathBuf::from("store2/receipt.png"),
                PathBuf::from("receipt-2.jpg"),
            ],
        );
        assert_eq!(
            paths,
            [
                PathBuf::from("out/receipt.png"),
                PathBuf::from("out/receipt-2.png"),
                PathBuf::from("out/receipt-2-2.png"),
            ]
        );
    }

    #[test]
    fn missing_config_is_an_error_but_absent_is_default() {
        assert_eq!(load_config(None).unwrap(), RectoConfig::default());
        assert!(load_config(Some(Path::new("/nonexistent/recto.toml"))).is_err());
    }

    #[test]
    fn extract_reads_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.txt");
        std::fs::write(&path, "CORNER CAFE\n03/14/2022\nTotal: $7.80\n").unwrap();

        let fields = extract_transcript(&path).unwrap();
        assert_eq!(fields.vendor.as_deref(), Some("CORNER CAFE"));
        assert_eq!(fields.total, Amount::from_cents(780));
        assert!(extract_transcript(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn preprocess_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.png");
        write_two_tone(&src);
        let dest = dir.path().join("a/b/out.png");

        preprocess(&RectoConfig::default(), &src, &dest).unwrap();
        assert!(dest.exists());
    }

    #[test]
    fn classify_rejects_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        assert!(classify(&RectoConfig::default(), &bogus).is_err());

        let good = dir.path().join("good.png");
        write_two_tone(&good);
        classify(&RectoConfig::default(), &good).unwrap();
    }
}
