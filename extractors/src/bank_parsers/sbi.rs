use super::BankParser;
use crate::pattern_engine::{
    TransactionPattern, FIELD_AMOUNT, FIELD_DATE, FIELD_MASK, FIELD_RECIPIENT, FIELD_REF_ID,
};
use shared_types::{Source, TransactionType};

pub struct SbiParser {
    sms_patterns: Vec<TransactionPattern>,
    email_patterns: Vec<TransactionPattern>,
}

impl SbiParser {
    pub fn new() -> Self {
        Self {
            sms_patterns: vec![
                // Debit with Ref ID
                TransactionPattern::new(
                    r"(?i)(?:Txn\s*of|INR|Rs\.?)\s*([\d,]+\.?\d*)\s*(?:on|debited\s*from)\s*.*?A/c\s*(?:.*?|x*|X*)(\d+)\s*at\s*(.*?)\s*on\s*(\d{2}[A-Z]{3,}\d{2,4}|\d{2}[-/]\d{2}[-/]\d{2,4}).*?[Rr]ef[:\.\s-]+(\w+)",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Debit without Ref ID
                TransactionPattern::new(
                    r"(?i)(?:Txn\s*of|INR|Rs\.?)\s*([\d,]+\.?\d*)\s*(?:on|debited\s*from)\s*.*?A/c\s*(?:.*?|x*|X*)(\d+)\s*at\s*(.*?)\s*on\s*(\d{2}[A-Z]{3,}\d{2,4}|\d{2}[-/]\d{2}[-/]\d{2,4})",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4)].into_iter().collect(),
                ),
                // Credit (TD closure etc)
                TransactionPattern::new(
                    r"(?i)A/C\s*(?:.*?|x*|X*)(\d+)\s*Credited\.\s*(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*on\s*(\d{2}/\d{2}/\d{2,4})\s*on\s*account\s*of\s*(.*?)\.-",
                    1.0,
                    TransactionType::Credit,
                    [(FIELD_MASK, 1), (FIELD_AMOUNT, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4)].into_iter().collect(),
                ),
                // ATM Withdrawal
                TransactionPattern::new(
                    r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*withdrawn\s*(?:from\s*ATM|at\s*ATM|Cash\s*withdrawal).*?(?:A/c|Card)\s*(?:.*?|x*|X*)(\d+)\s*on\s*(\d{2}[A-Z]{3,}\d{2,4}|\d{2}[-/]\d{2}[-/]\d{2,4})(?:.*?Ref[:\.\s-]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_REF_ID, 4)].into_iter().collect(),
                ),
                // IMPS/NEFT/RTGS
                TransactionPattern::new(
                    r"(?i)(?:IMPS|NEFT|RTGS)\s*(?:of)?\s*(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*(?:debited|from)\s*A/c\s*(?:.*?|x*|X*)(\d+)\s*to\s*(.*?)\s*on\s*(\d{2}[A-Z]{3,}\d{2,4}|\d{2}[-/]\d{2}[-/]\d{2,4}).*?(?:Ref|UTR)[:\.\s-]+(\w+)",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
            ],
            // SBI's email alerts are matched by a single loose regex-search in
            // the original source rather than a fixed pattern list.
            email_patterns: vec![TransactionPattern::new(
                r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*.*?(?:at|to|towards|for|on)\s+([A-Z0-9 *]{3,30}?)\s*(?:on|at|\.|from|using)\s*(\d{2}[a-zA-Z]{3}\d{2,4}|\d{2}-\d{2}-\d{2,4}).*?(?:A/c|card|XX)\s*(\d{4,})",
                0.8,
                TransactionType::Debit,
                [(FIELD_AMOUNT, 1), (FIELD_RECIPIENT, 2), (FIELD_DATE, 3), (FIELD_MASK, 4)].into_iter().collect(),
            )],
        }
    }
}

impl BankParser for SbiParser {
    fn name(&self) -> &'static str {
        "SBI"
    }

    fn can_handle(&self, sender: &str, content: &str) -> bool {
        sender.to_lowercase().contains("sbi") || content.to_lowercase().contains("sbi")
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
    fn matches_debit_with_ref_id() {
        let parser = SbiParser::new();
        let text = "Rs.500.00 debited from A/c XX1234 at Dominos Pizza on 15Jul25 Ref No IB123456789";
        assert!(parser.can_handle("SBIINB", text));
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
        let hits: Vec<_> = parser
            .patterns_for(Source::Sms)
            .iter()
            .filter_map(|p| evaluate_pattern(p, text, text, None, now))
            .collect();
        let best = hits.iter().max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap()).unwrap();
        assert_eq!(best.account.mask, Some("1234".to_string()));
        assert_eq!(best.ref_id, "IB123456789");
    }
}
