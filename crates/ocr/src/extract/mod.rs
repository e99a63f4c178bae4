//! Field heuristics over recognized receipt text.
//!
//! Each field has its own module with an explicit, ordered list of
//! strategies; the order in those lists is the precedence.

pub mod date;
pub mod total;
pub mod vendor;

use crate::types::{ExtractedFields, RecognitionResult};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}
pub(crate) use re;

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Recover vendor, date and total. Missing fields are `None`; this never fails.
    pub fn extract(recognition: &RecognitionResult) -> ExtractedFields {
        let fields = ExtractedFields {
            vendor: vendor::find_vendor(&recognition.lines),
            date: date::find_date(&recognition.full_text),
            total: total::find_total(&recognition.full_text),
        };
        tracing::debug!(
            vendor = fields.vendor.is_some(),
            date = fields.date.is_some(),
            total = fields.total.is_some(),
            "Extracted receipt fields"
        );
        fields
    }

    /// Convenience for a plain transcript with one recognized line per text line.
    pub fn extract_text(text: &str) -> ExtractedFields {
        Self::extract(&RecognitionResult::from_text(text))
    }
}
