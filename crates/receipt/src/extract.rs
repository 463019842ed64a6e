//! Turning OCR text into transaction fields.

use engine::Money;
use regex::Regex;

use crate::ReceiptError;

/// Lines mentioning these carry the amount to pay, most specific first.
const TOTAL_KEYWORDS: &[&str] = &[
    "tổng dịch vụ",
    "tổng thanh toán",
    "tổng cộng",
    "thanh toán",
    "total",
    "cash",
    "tổng",
];

const FOOD_KEYWORDS: &[&str] = &[
    "ăn uống",
    "restaurant",
    "food",
    "cafe",
    "coffee",
    "quán ăn",
    "cà phê",
];

/// Category suggested for food receipts.
pub const FOOD_CATEGORY: &str = "Ăn uống";

/// Amounts up to this are more likely a quantity or a line item than the
/// receipt total (10 000 major units).
const SMALL_AMOUNT: Money = Money::new(1_000_000);

/// What could be guessed from a receipt. Every field is optional: OCR text
/// is noisy and the user confirms before saving.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceiptFields {
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Strategy turning raw receipt text into fields.
pub trait TextToFields: Send + Sync {
    fn extract(&self, text: &str) -> ReceiptFields;
}

/// Keyword heuristics tuned on Vietnamese and English receipts.
#[derive(Clone, Debug)]
pub struct KeywordExtractor {
    number: Regex,
    long_number: Regex,
    short_food: Regex,
    small_amount: Money,
}

impl KeywordExtractor {
    pub fn new() -> Result<Self, ReceiptError> {
        Ok(Self {
            number: Regex::new(r"[0-9][0-9.,]*")?,
            long_number: Regex::new(r"[0-9][0-9.,]{3,}")?,
            short_food: Regex::new(r"(?i)\b(?:res|rest)\b")?,
            small_amount: SMALL_AMOUNT,
        })
    }

    /// Override the threshold under which an amount is treated as suspicious.
    pub fn with_small_amount(mut self, small_amount: Money) -> Self {
        self.small_amount = small_amount;
        self
    }

    fn numbers<'a>(pattern: &'a Regex, text: &'a str) -> impl Iterator<Item = Money> + 'a {
        pattern
            .find_iter(text)
            .filter_map(|m| Money::parse_printed(m.as_str()).ok())
    }

    fn amount(&self, lines: &[&str], text: &str) -> Option<Money> {
        let from_total = TOTAL_KEYWORDS.iter().find_map(|keyword| {
            let line = lines
                .iter()
                .find(|line| line.to_lowercase().contains(keyword))?;
            Self::numbers(&self.number, line).max()
        });

        let long: Vec<Money> = Self::numbers(&self.long_number, text).collect();
        let amount = from_total.or_else(|| long.last().copied());

        if amount.is_none_or(|amount| amount <= self.small_amount)
            && let Some(bigger) = long.iter().rev().find(|n| **n > self.small_amount)
        {
            return Some(*bigger);
        }
        amount
    }

    fn category(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        let is_food = FOOD_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
            || self.short_food.is_match(text);
        is_food.then(|| FOOD_CATEGORY.to_string())
    }

    /// The first line with an uppercase letter is usually the shop name.
    fn description(lines: &[&str]) -> Option<String> {
        lines
            .iter()
            .find(|line| line.chars().any(char::is_uppercase))
            .or_else(|| lines.first())
            .map(|line| line.to_string())
    }
}

impl TextToFields for KeywordExtractor {
    fn extract(&self, text: &str) -> ReceiptFields {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        ReceiptFields {
            amount: self.amount(&lines, text),
            category: self.category(text),
            description: Self::description(&lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> ReceiptFields {
        KeywordExtractor::new().unwrap().extract(text)
    }

    #[test]
    fn total_line_wins_over_other_numbers() {
        let text = "HIGHLANDS COFFEE\n\
                    Bac xiu x2 58.000\n\
                    Tổng cộng: 2 món 116.000\n\
                    Tiền khách đưa 200.000\n";
        let fields = extract(text);
        assert_eq!(fields.amount, Some(Money::new(11_600_000)));
        assert_eq!(fields.category.as_deref(), Some(FOOD_CATEGORY));
        assert_eq!(fields.description.as_deref(), Some("HIGHLANDS COFFEE"));
    }

    #[test]
    fn specific_keyword_is_tried_before_generic_one() {
        let text = "Shop\nTổng 90.000\nTổng thanh toán 85.000\n";
        assert_eq!(extract(text).amount, Some(Money::new(8_500_000)));
    }

    #[test]
    fn falls_back_to_last_long_number() {
        let text = "market\n12/03 45.500\n1.250.000\n";
        let fields = extract(text);
        assert_eq!(fields.amount, Some(Money::new(125_000_000)));
        assert_eq!(fields.category, None);
        // no uppercase anywhere: the first line is used
        assert_eq!(fields.description.as_deref(), Some("market"));
    }

    #[test]
    fn small_total_prefers_a_larger_number() {
        let text = "Grab Food\nTOTAL 3\n350.000\nitems 2\n";
        assert_eq!(extract(text).amount, Some(Money::new(35_000_000)));
    }

    #[test]
    fn small_total_is_kept_without_alternatives() {
        let fields = KeywordExtractor::new()
            .unwrap()
            .with_small_amount(Money::new(10_000))
            .extract("Bakery\nTotal 45,00\n");
        assert_eq!(fields.amount, Some(Money::new(4_500)));
    }

    #[test]
    fn short_food_words_need_word_boundaries() {
        assert_eq!(
            extract("PHO 24 RES\nTotal 120.000").category.as_deref(),
            Some(FOOD_CATEGORY)
        );
        assert_eq!(extract("Address: 12 Le Loi\nTotal 120.000").category, None);
    }

    #[test]
    fn empty_text_gives_nothing() {
        assert_eq!(extract("  \n \n"), ReceiptFields::default());
    }
}
