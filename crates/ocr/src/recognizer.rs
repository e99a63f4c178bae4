use image::GrayImage;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::types::TextRegion;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
    #[error("A shared recognizer is already installed")]
    AlreadyInstalled,
    #[error("No shared recognizer has been installed")]
    NotInstalled,
}

/// Abstraction over an OCR backend.
///
/// Implementations receive the normalized single-channel image and return the
/// detected regions in reading order. An image without text yields an empty
/// vector, not an error.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextRegion>, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Arc<T> {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextRegion>, OcrError> {
        (**self).recognize(image)
    }
}

// ── Process-wide instance ─────────────────────────────────────────────────────

static SHARED: OnceLock<Arc<dyn TextRecognizer>> = OnceLock::new();

/// Install the process-wide recognizer. Engines are expensive to build, so
/// this happens once at startup; a second call fails.
pub fn install_shared(recognizer: Arc<dyn TextRecognizer>) -> Result<(), OcrError> {
    SHARED.set(recognizer).map_err(|_| OcrError::AlreadyInstalled)
}

pub fn shared() -> Result<Arc<dyn TextRecognizer>, OcrError> {
    SHARED.get().cloned().ok_or(OcrError::NotInstalled)
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set list of regions regardless of the image — useful for
/// testing extraction without an OCR engine, or replaying a transcript.
pub struct MockRecognizer {
    pub regions: Vec<TextRegion>,
}

impl MockRecognizer {
    /// One full-confidence region per line of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            regions: text.lines().map(|l| TextRegion::new(l, None, 1.0)).collect(),
        }
    }

    pub fn from_regions(regions: Vec<TextRegion>) -> Self {
        Self { regions }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextRegion>, OcrError> {
        Ok(self.regions.clone())
    }
}

/// Placeholder used when no engine is compiled in.
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextRegion>, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, TextRecognizer};
    use crate::types::TextRegion;
    use image::{DynamicImage, GrayImage};
    use leptess::LepTess;
    use std::io::Cursor;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &GrayImage) -> Result<Vec<TextRegion>, OcrError> {
            let png = encode_png(image)?;
            // LepTess is not Sync; each call gets its own engine handle.
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
            let confidence = lt.mean_text_conf() as f32 / 100.0;
            Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| TextRegion::new(l, None, confidence))
                .collect())
        }
    }

    fn encode_png(image: &GrayImage) -> Result<Vec<u8>, OcrError> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
        Ok(buf)
    }
}
