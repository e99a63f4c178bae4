use recto_core::{Amount, ReceiptDate};
use serde::{Deserialize, Serialize};

/// Pixel rectangle of a recognized region, in the coordinates of the
/// normalized image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One region reported by a recognizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRegion {
    pub text: String,
    pub bbox: Option<BoundingBox>,
    /// Engine confidence (0.0–1.0). Carried through, not used by extraction.
    pub confidence: f32,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, bbox: Option<BoundingBox>, confidence: f32) -> Self {
        Self { text: text.into(), bbox, confidence: confidence.clamp(0.0, 1.0) }
    }
}

/// Text produced for a single image, in recognizer reading order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecognitionResult {
    /// One entry per detected region, top-to-bottom.
    pub lines: Vec<String>,
    /// `lines` joined with `\n`.
    pub full_text: String,
    pub regions: Vec<TextRegion>,
}

impl RecognitionResult {
    pub fn from_regions(regions: Vec<TextRegion>) -> Self {
        let lines: Vec<String> = regions.iter().map(|r| r.text.clone()).collect();
        let full_text = lines.join("\n");
        Self { lines, full_text, regions }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_regions(
            lines
                .into_iter()
                .map(|l| TextRegion::new(l, None, 1.0))
                .collect(),
        )
    }

    /// Treat a plain transcript as one region per line.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// The fields recovered from one receipt. Every field is independently optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedFields {
    pub vendor: Option<String>,
    pub date: Option<ReceiptDate>,
    pub total: Option<Amount>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.vendor.is_none() && self.date.is_none() && self.total.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn text_region_clamps_confidence() {
        assert_eq!(TextRegion::new("a", None, 1.5).confidence, 1.0);
        assert_eq!(TextRegion::new("a", None, -0.1).confidence, 0.0);
    }

    #[test]
    fn from_regions_joins_lines_in_order() {
        let r = RecognitionResult::from_regions(vec![
            TextRegion::new("STARBUCKS", Some(BoundingBox { x: 0, y: 0, width: 90, height: 12 }), 0.9),
            TextRegion::new("Total $5.45", None, 0.8),
        ]);
        assert_eq!(r.lines, vec!["STARBUCKS", "Total $5.45"]);
        assert_eq!(r.full_text, "STARBUCKS\nTotal $5.45");
        assert_eq!(r.regions[0].bbox.unwrap().width, 90);
    }

    #[test]
    fn empty_text_is_empty_result() {
        assert!(RecognitionResult::from_text("").is_empty());
        assert!(RecognitionResult::from_text("  \n\t\n").is_empty());
        assert!(!RecognitionResult::from_text("x").is_empty());
    }

    #[test]
    fn extracted_fields_serialize_with_nulls() {
        let fields = ExtractedFields {
            vendor: Some("STARBUCKS".into()),
            date: Some(ReceiptDate::Parsed(NaiveDate::from_ymd_opt(2022, 3, 14).unwrap())),
            total: None,
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["vendor"], "STARBUCKS");
        assert_eq!(json["date"], "2022-03-14");
        assert!(json["total"].is_null());
    }
}
