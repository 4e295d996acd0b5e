use super::BankParser;
use crate::pattern_engine::{
    TransactionPattern, FIELD_AMOUNT, FIELD_DATE, FIELD_MASK, FIELD_RECIPIENT, FIELD_REF_ID,
};
use shared_types::{Source, TransactionType};

pub struct KotakParser {
    sms_patterns: Vec<TransactionPattern>,
}

impl KotakParser {
    pub fn new() -> Self {
        Self {
            sms_patterns: vec![
                // Debit
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*debited\s*from\s*A/c\s*(?:.*?|x*|X*)(\d+)\s*on\s*([\d-]+)\s*to\s*(.*?)(?:\.\s*Ref[:\.\s-]+(\w+))?",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Spent
                TransactionPattern::new(
                    r"(?i)Spent\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*Kotak\s*.*?(?:Card|A/c)\s*([xX]*\d+)\s*at\s*(.*?)\s*on\s*([\d-]+)(?:.*?[Rr]ef[:\.\s-]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
            ],
        }
    }
}

impl BankParser for KotakParser {
    fn name(&self) -> &'static str {
        "Kotak"
    }

    fn can_handle(&self, sender: &str, content: &str) -> bool {
        sender.to_lowercase().contains("kotak") || content.to_lowercase().contains("kotak")
    }

    fn patterns_for(&self, _source: Source) -> &[TransactionPattern] {
        // Kotak's email alerts reuse the SMS pattern list in the original
        // source rather than declaring their own.
        &self.sms_patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_engine::evaluate_pattern;
    use chrono::{TimeZone, Utc};

    #[test]
    fn matches_debit_sms() {
        let parser = KotakParser::new();
        let text = "Rs.2,000.00 debited from A/c XX4321 on 05-08-2025 to Amazon Pay Ref 554433";
        assert!(parser.can_handle("KOTAKB", text));
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 12, 0, 0).unwrap();
        let hits: Vec<_> = parser
            .patterns_for(Source::Sms)
            .iter()
            .filter_map(|p| evaluate_pattern(p, text, text, None, now))
            .collect();
        let best = hits.iter().max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap()).unwrap();
        assert_eq!(best.account.mask, Some("4321".to_string()));
        assert_eq!(best.ref_id, "554433");
    }
}
