use super::BankParser;
use crate::pattern_engine::{
    TransactionPattern, FIELD_AMOUNT, FIELD_DATE, FIELD_MASK, FIELD_RECIPIENT, FIELD_REF_ID,
};
use shared_types::{Source, TransactionType};

pub struct IciciParser {
    sms_patterns: Vec<TransactionPattern>,
    email_patterns: Vec<TransactionPattern>,
}

impl IciciParser {
    pub fn new() -> Self {
        Self {
            sms_patterns: vec![
                // High specificity: Spent with Ref ID (exact shape of literal scenario 2)
                TransactionPattern::new(
                    r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*spent\s*(?:using|on)\s*ICICI\s*Bank\s*.*?(?:Card|A/c)\s*([xX*]*\d+)\s*on\s*(\d{2}-[a-zA-Z]{3}-\d{2,4})\s*(?:on|at)\s*(.*?)\.?\s*(?:Ref[:\.\s-]+|Ref\s*No\s+)(\w+)",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Standard specificity: Spent (no ref id required)
                TransactionPattern::new(
                    r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*spent\s*(?:using|on)\s*ICICI\s*Bank\s*.*?(?:Card|A/c)\s*([xX]*\d+)\s*on\s*(\d{2}-[a-zA-Z]{3}-\d{2,4})\s*(?:on|at)\s*(.*?)\.\s*(?:Avl|Ref|$)",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4)].into_iter().collect(),
                ),
                // Debit format
                TransactionPattern::new(
                    r"(?i)A/c\s*([xX]*\d+)\s*is\s*debited\s*for\s*(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*on\s*(\d{2}-[a-zA-Z]{3}-\d{2,4})\.\s*Info:\s*(.*?)(?:\.\s*(?:Ref[:\.\s-]+|Ref\s*No\s+)(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_MASK, 1), (FIELD_AMOUNT, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // ATM Withdrawal
                TransactionPattern::new(
                    r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*withdrawn\s*from\s*(?:ATM|Cash|ATM\s*withdrawal).*?(?:A/c|Card)\s*([xX]*\d+)\s*on\s*(\d{2}-[a-zA-Z]{3}-\d{2,4})(?:.*?Ref[:\.\s-]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_REF_ID, 4)].into_iter().collect(),
                ),
                // IMPS/NEFT
                TransactionPattern::new(
                    r"(?i)(?:IMPS|NEFT|RTGS)\s*(?:of)?\s*(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*(?:debited|from)\s*A/c\s*([xX]*\d+)\s*to\s*(.*?)\s*on\s*(\d{2}-[a-zA-Z]{3}-\d{2,4}).*?(?:Ref|UTR)[:\.\s-]+(\w+)",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
            ],
            // ICICI's own emails are loose/varied in the original source; a
            // single forgiving pattern stands in for its regex-search fallback.
            email_patterns: vec![TransactionPattern::new(
                r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*.*?(?:at|to|towards)\s+([A-Za-z0-9 *]{3,30}?)\s*(?:on|at)\s*(\d{2}[-/][a-zA-Z]{3,9}[-/]\d{2,4}).*?(?:A/c|Account|card|Card|XX|xx|ending in)\s*.*?(\d{4,})",
                0.85,
                TransactionType::Debit,
                [(FIELD_AMOUNT, 1), (FIELD_RECIPIENT, 2), (FIELD_DATE, 3), (FIELD_MASK, 4)].into_iter().collect(),
            )],
        }
    }
}

impl BankParser for IciciParser {
    fn name(&self) -> &'static str {
        "ICICI"
    }

    fn can_handle(&self, sender: &str, content: &str) -> bool {
        sender.to_lowercase().contains("icici") || content.to_lowercase().contains("icici")
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
    use chrono::{TimeZone, Utc};

    #[test]
    fn matches_literal_spent_sms_scenario() {
        let parser = IciciParser::new();
        let text = "INR 869.00 spent using ICICI Bank Card XX0004 on 23-Sep-24 on IND*Amazon. Avl Limit: INR 2,39,131.00";
        let now = Utc.with_ymd_and_hms(2024, 9, 23, 12, 0, 0).unwrap();
        let hits: Vec<_> = parser
            .patterns_for(Source::Sms)
            .iter()
            .filter_map(|p| evaluate_pattern(p, text, text, None, now))
            .collect();
        assert!(!hits.is_empty());
        let best = hits.iter().max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap()).unwrap();
        assert_eq!(best.account.mask, Some("0004".to_string()));
        assert_eq!(
            best.credit_limit,
            Some(rust_decimal::Decimal::new(23913100, 2))
        );
    }
}
