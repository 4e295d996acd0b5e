use super::BankParser;
use crate::pattern_engine::{
    TransactionPattern, FIELD_AMOUNT, FIELD_DATE, FIELD_MASK, FIELD_RECIPIENT,
};
use shared_types::{Source, TransactionType};

/// Fallback parser tried when no named bank parser claims the message.
/// `can_handle` always returns true so this is the last entry a registry
/// iteration can still match against (§4.2's "generic fallback" tier).
pub struct GenericParser {
    sms_patterns: Vec<TransactionPattern>,
    email_patterns: Vec<TransactionPattern>,
}

impl GenericParser {
    pub fn new() -> Self {
        Self {
            sms_patterns: vec![
                // Debit
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*debited\s*from.*?a/c\s*([xX]*\d+)(?:.*to\s+([^.]+))?",
                    0.6,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3)].into_iter().collect(),
                ),
                // Spent
                TransactionPattern::new(
                    r"(?i)Spent\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*.*?card\s*([xX]*\d+)(?:.*at\s+([^.]+))?",
                    0.6,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3)].into_iter().collect(),
                ),
                // Credit/deposit
                TransactionPattern::new(
                    r"(?i)(?:credited|deposited).*?(?:Rs\.?|INR)\s*([\d,]+\.?\d*).*?a/c\s*([xX]*\d+)(?:.*from\s+([^.]+))?",
                    0.6,
                    TransactionType::Credit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3)].into_iter().collect(),
                ),
            ],
            email_patterns: vec![
                // Spend
                TransactionPattern::new(
                    r"(?i)spend\s*of\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*at\s*(.*?)\s*on\s*(?:A/c|Card)\s*(?:.*?|x*|X*)(\d+)\s*on\s*(\d{2}-\d{2}-\d{2,4})",
                    0.6,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_RECIPIENT, 2), (FIELD_MASK, 3), (FIELD_DATE, 4)].into_iter().collect(),
                ),
                // Debit
                TransactionPattern::new(
                    r"(?i)(?:A/c|Card)\s*(?:.*?|x*|X*)(\d+)\s*has\s*been\s*debited\s*for\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*(\d{2}-\d{2}-\d{2,4})\s*towards\s*(.*?)\.",
                    0.6,
                    TransactionType::Debit,
                    [(FIELD_MASK, 1), (FIELD_AMOUNT, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4)].into_iter().collect(),
                ),
                // Generic alert
                TransactionPattern::new(
                    r"(?i)(?:A/c|Card)\s*(?:.*?|x*|X*)(\d+):?\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*(?:spent|debited|spent\s*at)\s*(?:at|to)?\s*(.*?)\s*on\s*(\d{2}-\d{2}-\d{2,4})",
                    0.55,
                    TransactionType::Debit,
                    [(FIELD_MASK, 1), (FIELD_AMOUNT, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4)].into_iter().collect(),
                ),
                // Loose fallback: any message mentioning a transaction keyword
                // with an amount and a recognizable mask.
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*).*?(?:at|to|towards|for)\s+([A-Z0-9 *]{3,30}?)\s*(?:on|at|\.|from|using).*?(\d{2}[-/]\d{2}[-/]\d{2,4}).*?(?:A/c|Account|Card|XX|ending\s*in|ending\s*with)\s*.*?(\d{4,})",
                    0.4,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_RECIPIENT, 2), (FIELD_DATE, 3), (FIELD_MASK, 4)].into_iter().collect(),
                ),
            ],
        }
    }
}

impl BankParser for GenericParser {
    fn name(&self) -> &'static str {
        "Generic"
    }

    fn can_handle(&self, _sender: &str, _content: &str) -> bool {
        true
    }

    fn patterns_for(&self, source: Source) -> &[TransactionPattern] {
        match source {
            Source::Email => &self.email_patterns,
            _ => &self.sms_patterns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_engine::evaluate_pattern;
    use chrono::Utc;

    #[test]
    fn always_claims_unrecognized_sender() {
        let parser = GenericParser::new();
        assert!(parser.can_handle("UNKNOWNBANK", "anything"));
    }

    #[test]
    fn matches_unbranded_debit_sms() {
        let parser = GenericParser::new();
        let text = "Rs.450.00 debited from a/c XX9988 to Local Store";
        let now = Utc::now();
        let hits: Vec<_> = parser
            .patterns_for(Source::Sms)
            .iter()
            .filter_map(|p| evaluate_pattern(p, text, text, None, now))
            .collect();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].account.mask, Some("9988".to_string()));
    }
}
