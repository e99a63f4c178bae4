/// Lowercase fragments that mark a line as receipt boilerplate rather than the
/// business name. Matched as substrings, so `"subtotal"` is also caught by `"total"`.
pub const VENDOR_BLACKLIST: [&str; 18] = [
    "total", "subtotal", "amount", "gst", "tax", "invoice", "taxable", "bill", "qty",
    "item", "change", "tender", "cash", "visa", "mastercard", "****", "www", "http",
];

const MAX_CANDIDATES: usize = 6;
const MAX_WORDS: usize = 5;
const MIN_LETTERS: usize = 2;

/// The business name is normally one of the first short lines on the slip.
/// Falls back to the first non-empty line when nothing qualifies.
pub fn find_vendor(lines: &[String]) -> Option<String> {
    let mut non_empty = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty());
    let first = non_empty.next()?;

    let vendor = std::iter::once(first)
        .chain(non_empty)
        .take(MAX_CANDIDATES)
        .find(|line| is_vendor_like(line));

    match vendor {
        Some(line) => Some(line.to_string()),
        None => {
            tracing::debug!(line = first, "No vendor-like line; using the first line");
            Some(first.to_string())
        }
    }
}

fn is_vendor_like(line: &str) -> bool {
    let lower = line.to_lowercase();
    if VENDOR_BLACKLIST.iter().any(|b| lower.contains(b)) {
        return false;
    }
    if lower.chars().filter(|c| c.is_alphabetic()).count() < MIN_LETTERS {
        return false;
    }
    lower.split_whitespace().count() <= MAX_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    fn vendor(text: &str) -> Option<String> {
        find_vendor(&lines(text))
    }

    #[test]
    fn first_short_line_is_the_vendor() {
        assert_eq!(vendor("STARBUCKS #2291\n123 Main St\nTotal: $5.45").as_deref(), Some("STARBUCKS #2291"));
    }

    #[test]
    fn skips_blank_and_boilerplate_lines() {
        let text = "\n   \nTAX INVOICE\n0012345678\nJoe's Diner\nTotal 9.00";
        assert_eq!(vendor(text).as_deref(), Some("Joe's Diner"));
    }

    #[test]
    fn result_is_trimmed() {
        assert_eq!(vendor("   Corner Shop   \n").as_deref(), Some("Corner Shop"));
    }

    #[test]
    fn long_lines_are_passed_over() {
        let text = "Thank you for visiting our lovely store today\nACME";
        assert_eq!(vendor(text).as_deref(), Some("ACME"));
    }

    #[test]
    fn blacklist_is_case_insensitive_substring() {
        assert!(!is_vendor_like("VISA ****1234"));
        assert!(!is_vendor_like("www.example.com"));
        assert!(!is_vendor_like("Cashew Hut"));
        assert!(is_vendor_like("Blue Bottle"));
    }

    #[test]
    fn needs_two_letters() {
        assert!(!is_vendor_like("1234 5678"));
        assert!(!is_vendor_like("#1"));
        assert!(is_vendor_like("A1 B2"));
    }

    #[test]
    fn only_first_six_candidates_are_considered() {
        let text = "1\n2\n3\n4\n5\n6\nReal Vendor";
        assert_eq!(vendor(text).as_deref(), Some("1"));
    }

    #[test]
    fn falls_back_to_first_line_even_if_blacklisted() {
        assert_eq!(vendor("Subtotal 4.00\nTotal 4.40\nVISA").as_deref(), Some("Subtotal 4.00"));
    }

    #[test]
    fn absent_without_non_empty_lines() {
        assert_eq!(vendor(""), None);
        assert_eq!(vendor(" \n\t\n"), None);
        assert_eq!(find_vendor(&[]), None);
    }
}
