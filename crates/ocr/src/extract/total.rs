use recto_core::Amount;

use super::re;

re!(re_amount_label,
    r"(?i)\b(total|amount|grand total|grand|balance|invoice total|total amount|amount due|net amt|grandtotal)\b[:\s]*[$€£¥₹]?\s*([0-9,]+\.[0-9]{2})");
re!(re_currency_number,
    r"[0-9]{1,3}(?:,[0-9]{3})*\.[0-9]{2}|[0-9]+\.[0-9]{2}");

/// How a total is looked for, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalStrategy {
    /// A total-like keyword followed by an amount. The last one printed wins,
    /// since receipts list subtotals before the final figure.
    Labeled,
    /// The last currency-shaped number anywhere in the text.
    Positional,
}

pub const TOTAL_STRATEGIES: [TotalStrategy; 2] = [TotalStrategy::Labeled, TotalStrategy::Positional];

impl TotalStrategy {
    pub fn find(self, text: &str) -> Option<Amount> {
        match self {
            TotalStrategy::Labeled => {
                let amounts: Vec<&str> = re_amount_label()
                    .captures_iter(text)
                    .filter_map(|c| c.get(2).map(|m| m.as_str()))
                    .collect();
                amounts.into_iter().rev().find_map(Amount::parse_ocr)
            }
            TotalStrategy::Positional => re_currency_number()
                .find_iter(text)
                .last()
                .and_then(|m| Amount::parse_ocr(m.as_str())),
        }
    }
}

pub fn find_total(text: &str) -> Option<Amount> {
    TOTAL_STRATEGIES.iter().find_map(|strategy| {
        let amount = strategy.find(text)?;
        tracing::debug!(?strategy, %amount, "Total found");
        Some(amount)
    })
}
