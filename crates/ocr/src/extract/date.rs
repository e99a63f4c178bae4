use chrono::NaiveDate;
use recto_core::ReceiptDate;

use super::re;

re!(re_numeric_month_first,
    r"\b(0?[1-9]|1[0-2])[/\-.](0?[1-9]|[12][0-9]|3[01])[/\-.]([0-9]{2,4})\b");
re!(re_iso_year_first,
    r"\b(20[0-9]{2})[/\-.](0?[1-9]|1[0-2])[/\-.](0?[1-9]|[12][0-9]|3[01])\b");
re!(re_month_name_first,
    r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*[ \-.]?[0-9]{1,2}(?:,[ \-.]?|[ \-.])[0-9]{2,4}\b");
re!(re_day_first_month_name,
    r"(?i)\b[0-9]{1,2}[ \-.](?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*[ \-.]?[0-9]{2,4}\b");

/// Date shapes, in precedence order. The first family that matches anywhere
/// in the text decides; within it the leftmost match is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    /// `03/14/2022`, `3-14-22`, `03.14.2022`
    NumericMonthFirst,
    /// `2022-03-14`, `2022/3/14`
    IsoYearFirst,
    /// `March 14, 2022`, `Mar 14 22`; a separator must sit between day and year
    MonthNameFirst,
    /// `14 Mar 2022`, `14-March-22`
    DayFirstMonthName,
}

pub const DATE_PATTERNS: [DatePattern; 4] = [
    DatePattern::NumericMonthFirst,
    DatePattern::IsoYearFirst,
    DatePattern::MonthNameFirst,
    DatePattern::DayFirstMonthName,
];

impl DatePattern {
    fn regex(self) -> &'static regex::Regex {
        match self {
            DatePattern::NumericMonthFirst => re_numeric_month_first(),
            DatePattern::IsoYearFirst => re_iso_year_first(),
            DatePattern::MonthNameFirst => re_month_name_first(),
            DatePattern::DayFirstMonthName => re_day_first_month_name(),
        }
    }

    pub fn first_match(self, text: &str) -> Option<&str> {
        self.regex().find(text).map(|m| m.as_str())
    }
}

const MIN_TOKEN_LEN: usize = 6;
const MAX_TOKEN_LEN: usize = 10;

pub fn find_date(text: &str) -> Option<ReceiptDate> {
    for pattern in DATE_PATTERNS {
        if let Some(candidate) = pattern.first_match(text) {
            return Some(match parse_fuzzy(candidate) {
                Some(date) => {
                    tracing::debug!(?pattern, %date, "Date found");
                    ReceiptDate::Parsed(date)
                }
                None => {
                    tracing::warn!(?pattern, candidate, "Date-like text did not parse; keeping it raw");
                    ReceiptDate::Raw(candidate.to_string())
                }
            });
        }
    }

    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|tok| (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&tok.chars().count()))
        .find_map(parse_strict)
        .map(|date| {
            tracing::debug!(%date, "Date found by token scan");
            ReceiptDate::Parsed(date)
        })
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Month-first parse of a matched date fragment. Punctuation and words that
/// are not month names are skipped.
fn parse_fuzzy(candidate: &str) -> Option<NaiveDate> {
    let mut month = None;
    let mut numbers = Vec::new();
    for run in alnum_runs(candidate) {
        if run.starts_with(|c: char| c.is_ascii_digit()) {
            numbers.push(run);
        } else if month.is_none() {
            month = month_from_name(run);
        }
    }

    match month {
        Some(month) => {
            let [day, year] = numbers.as_slice() else {
                return None;
            };
            if day.len() > 2 {
                return None;
            }
            NaiveDate::from_ymd_opt(expand_year(year)?, month, day.parse().ok()?)
        }
        None => numeric_date(&numbers),
    }
}

/// The whole token must be a date: `M/D/Y`, `Y-M-D` (any of `/ - .`) or `YYYYMMDD`.
fn parse_strict(token: &str) -> Option<NaiveDate> {
    if token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit()) {
        return numeric_date(&[&token[..4], &token[4..6], &token[6..]]);
    }
    let sep = token.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let parts: Vec<&str> = token.split(sep).collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    numeric_date(&parts)
}

/// Three numeric fields. A four-digit first field is a year (Y-M-D); otherwise
/// month comes first, swapped with the day when only that reading is valid.
fn numeric_date(parts: &[&str]) -> Option<NaiveDate> {
    let [a, b, c] = parts else {
        return None;
    };
    if a.len() == 4 {
        if b.len() > 2 || c.len() > 2 {
            return None;
        }
        return NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);
    }
    if a.len() > 2 || b.len() > 2 {
        return None;
    }
    let (mut month, mut day): (u32, u32) = (a.parse().ok()?, b.parse().ok()?);
    if month > 12 && day <= 12 {
        std::mem::swap(&mut month, &mut day);
    }
    NaiveDate::from_ymd_opt(expand_year(c)?, month, day)
}

/// Two-digit years pivot at 70: `00`–`69` are 2000s, `70`–`99` are 1900s.
/// Fixed rather than relative to today, so results don't drift with the clock.
fn expand_year(s: &str) -> Option<i32> {
    let y: i32 = s.parse().ok()?;
    match s.len() {
        2 if y < 70 => Some(2000 + y),
        2 => Some(1900 + y),
        4 => Some(y),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_ascii_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Maximal runs of ASCII letters or ASCII digits; anything else separates.
fn alnum_runs(s: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    // (start offset, is digit run)
    let mut current: Option<(usize, bool)> = None;
    for (i, c) in s.char_indices() {
        let class = if c.is_ascii_digit() {
            Some(true)
        } else if c.is_ascii_alphabetic() {
            Some(false)
        } else {
            None
        };
        if let Some((from, is_digit)) = current {
            if class == Some(is_digit) {
                continue;
            }
            runs.push(&s[from..i]);
        }
        current = class.map(|is_digit| (i, is_digit));
    }
    if let Some((from, _)) = current {
        runs.push(&s[from..]);
    }
    runs
}
