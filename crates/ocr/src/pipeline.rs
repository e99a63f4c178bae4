use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extract::Extractor;
use crate::filters::GrayStats;
use crate::preprocess::{self, NormalizedImage, Normalizer, PreprocessError, Recipe};
use crate::recognizer::{OcrError, TextRecognizer};
use crate::types::{ExtractedFields, RecognitionResult};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The result of a single receipt processing run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub recipe: Recipe,
    pub stats: GrayStats,
    pub skew_degrees: Option<f32>,
    pub recognition: RecognitionResult,
    pub fields: ExtractedFields,
    /// Where the normalized image was written, if it was asked for.
    pub preprocessed_path: Option<PathBuf>,
}

/// Orchestrates: normalize → (save) → recognize → extract.
pub struct ReceiptPipeline<R: TextRecognizer> {
    recognizer: R,
    normalizer: Normalizer,
}

impl<R: TextRecognizer> ReceiptPipeline<R> {
    pub fn new(recognizer: R, normalizer: Normalizer) -> Self {
        Self { recognizer, normalizer }
    }

    /// Process an image on disk, optionally keeping the normalized image at `save_to`.
    pub fn process_file(&self, path: &Path, save_to: Option<&Path>) -> Result<ScanResult, PipelineError> {
        let normalized = self.normalizer.normalize(path)?;
        tracing::info!(
            path = %path.display(),
            recipe = %normalized.recipe,
            std_dev = normalized.stats.std_dev,
            "Normalized receipt image"
        );
        if let Some(dest) = save_to {
            preprocess::write_image(&normalized, dest)?;
        }
        self.finish(normalized, save_to.map(Path::to_path_buf))
    }

    /// Process encoded image bytes (camera capture, upload, …).
    pub fn process_bytes(&self, data: &[u8]) -> Result<ScanResult, PipelineError> {
        let normalized = self.normalizer.normalize_bytes(data)?;
        tracing::info!(recipe = %normalized.recipe, "Normalized receipt image");
        self.finish(normalized, None)
    }

    fn finish(&self, normalized: NormalizedImage, preprocessed_path: Option<PathBuf>) -> Result<ScanResult, PipelineError> {
        let regions = self.recognizer.recognize(&normalized.image)?;
        let recognition = RecognitionResult::from_regions(regions);
        let fields = Extractor::extract(&recognition);
        tracing::info!(
            lines = recognition.lines.len(),
            vendor = fields.vendor.is_some(),
            date = fields.date.is_some(),
            total = fields.total.is_some(),
            "Receipt processed"
        );

        Ok(ScanResult {
            recipe: normalized.recipe,
            stats: normalized.stats,
            skew_degrees: normalized.skew_degrees,
            recognition,
            fields,
            preprocessed_path,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
