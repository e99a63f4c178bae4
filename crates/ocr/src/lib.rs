//! Receipt scanning: image normalization, text recognition and field extraction.

pub mod config;
pub mod extract;
pub mod filters;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use config::{ConfigError, OcrConfig, PreprocessConfig, RectoConfig};
pub use extract::Extractor;
pub use filters::GrayStats;
pub use pipeline::{PipelineError, ReceiptPipeline, ScanResult};
pub use preprocess::{NormalizedImage, Normalizer, PreprocessError, Recipe, RecipePolicy};
pub use recognizer::{MockRecognizer, OcrError, TextRecognizer, UnavailableRecognizer};
pub use types::{BoundingBox, ExtractedFields, RecognitionResult, TextRegion};
