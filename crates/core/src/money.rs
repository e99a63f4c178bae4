use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative money value read off a receipt.
///
/// The decimal keeps the scale it was printed with, so `12.50` serializes
/// back as `"12.50"` rather than `"12.5"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn from_cents(cents: i64) -> Option<Self> {
        Self::from_decimal(Decimal::new(cents, 2))
    }

    /// Rejects negative values; `-0.00` collapses to zero.
    pub fn from_decimal(decimal: Decimal) -> Option<Self> {
        if decimal.is_sign_negative() && !decimal.is_zero() {
            return None;
        }
        Some(Amount(decimal.abs()))
    }

    /// Parse a currency-shaped OCR fragment such as `$1,234.56`.
    ///
    /// Everything except ASCII digits, `.` and `-` is dropped before parsing,
    /// which also removes thousands separators and currency symbols.
    pub fn parse_ocr(raw: &str) -> Option<Self> {
        let clean: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        if clean.is_empty() {
            return None;
        }
        let decimal = Decimal::from_str(&clean).ok()?;
        Self::from_decimal(decimal)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn to_cents(self) -> Option<i64> {
        (self.0 * Decimal::from(100)).round().to_i64()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
