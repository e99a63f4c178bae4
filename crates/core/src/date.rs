use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A transaction date found on a receipt.
///
/// `Raw` holds text that looked like a date but could not be turned into a
/// calendar day; it is kept verbatim so a reviewer can still read it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReceiptDate {
    Parsed(NaiveDate),
    Raw(String),
}

impl ReceiptDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ReceiptDate::Parsed(d) => Some(*d),
            ReceiptDate::Raw(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ReceiptDate::Parsed(_))
    }
}

impl From<NaiveDate> for ReceiptDate {
    fn from(date: NaiveDate) -> Self {
        ReceiptDate::Parsed(date)
    }
}

impl fmt::Display for ReceiptDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptDate::Parsed(d) => write!(f, "{}", d.format(ISO_DATE_FORMAT)),
            ReceiptDate::Raw(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for ReceiptDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReceiptDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match NaiveDate::parse_from_str(&s, ISO_DATE_FORMAT) {
            Ok(d) => ReceiptDate::Parsed(d),
            Err(_) => ReceiptDate::Raw(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_displays_as_iso() {
        let d = ReceiptDate::from(NaiveDate::from_ymd_opt(2022, 3, 14).unwrap());
        assert_eq!(d.to_string(), "2022-03-14");
        assert!(d.is_parsed());
    }

    #[test]
    fn raw_displays_verbatim() {
        let d = ReceiptDate::Raw("Jan 2020".into());
        assert_eq!(d.to_string(), "Jan 2020");
        assert_eq!(d.as_date(), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let parsed = ReceiptDate::Parsed(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"2024-01-05\"");

        let back: ReceiptDate = serde_json::from_str("\"2024-01-05\"").unwrap();
        assert_eq!(back, parsed);

        let raw: ReceiptDate = serde_json::from_str("\"Mar 99 x\"").unwrap();
        assert_eq!(raw, ReceiptDate::Raw("Mar 99 x".into()));
    }
}
