use super::BankParser;
use crate::pattern_engine::{
    TransactionPattern, FIELD_AMOUNT, FIELD_BALANCE, FIELD_DATE, FIELD_MASK, FIELD_RECIPIENT,
    FIELD_REF_ID,
};
use shared_types::{Source, TransactionType};

pub struct HdfcParser {
    sms_patterns: Vec<TransactionPattern>,
    email_patterns: Vec<TransactionPattern>,
}

impl HdfcParser {
    pub fn new() -> Self {
        Self {
            sms_patterns: vec![
                // Debit
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*debited\s*from\s*a/c\s*([xX]*\d+)\s*on\s*([\d/:-]+)\s*to\s*(.*?)\.\s*(?:Ref[:\.\s]+(\w+))?",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Spent
                TransactionPattern::new(
                    r"(?i)Spent\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*.*?(?:card|A/c)\s*([xX]*\d+)\s*at\s*(.*?)\s*on\s*([\d/:-]+)(?:.*?Ref[:\.\s]*(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Sent
                TransactionPattern::new(
                    r"(?i)Sent\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*From\s*HDFC\s*Bank\s*A/C\s*(?:.*?|x*|\*|X*)(\d+)\s*To\s*(.*?)\s*On\s*([\d/:-]+)(?:.*?Ref[:\.\s]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Credit
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*credited\s*to\s*HDFC\s*Bank\s*A/c\s*(?:.*?|x*|\*|X*)(\d+)\s*on\s*([\d/:-]+)\s*from\s*(.*?)(?:\s*\((?:UPI|Ref)[:\.\s]*(\w+)\))?",
                    1.0,
                    TransactionType::Credit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Salary/Deposit (UPDATE format with balance)
                TransactionPattern::new(
                    r"(?i)(?:Update!?\s*)?(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*deposited\s*in\s*HDFC\s*Bank\s*A/c\s*(?:[xX]*|\*)(\d+)\s*on\s*([\d-]+[A-Z]{3}-\d+)(?:.*?for\s*(.*?)\.)?(?:.*?Avl bal[:\s]*(?:Rs\.?|INR)\s*([\d,]+\.?\d*))?",
                    0.95,
                    TransactionType::Credit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_BALANCE, 5)].into_iter().collect(),
                ),
                // ATM Withdrawal
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*withdrawn\s*from\s*(?:ATM|Cash)\s*.*?(?:A/c|Card)\s*(?:.*?|x*|\*|X*)(\d+)\s*on\s*([\d/:-]+)(?:.*?Ref[:\.\s]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_REF_ID, 4)].into_iter().collect(),
                ),
                // IMPS/NEFT/RTGS
                TransactionPattern::new(
                    r"(?i)(?:IMPS|NEFT|RTGS)\s*(?:of|for)?\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*(?:debited|from)\s*HDFC\s*Bank\s*A/c\s*(?:.*?|x*|\*|X*)(\d+)\s*(?:to|towards)\s*(.*?)\s*on\s*([\d/:-]+).*?(?:Ref|UTR)[:\.\s]+(\w+)",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Funds Transfer (IB/SS format with balance)
                TransactionPattern::new(
                    r"(?i)(?:UPDATE:\s*)?(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*debited\s*from\s*HDFC\s*Bank\s*(?:A/C\s*)?(?:[xX]*|\*)(\d+)\s*on\s*([\d-]+[A-Z]{3}-\d+)(?:.*?DR-[xX]*(\d+))?(?:.*?Avl bal:(?:Rs\.?|INR)\s*([\d,]+\.?\d*))?",
                    0.95,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_DATE, 3), (FIELD_REF_ID, 4), (FIELD_BALANCE, 5)].into_iter().collect(),
                ),
            ],
            email_patterns: vec![
                // made a transaction (card)
                TransactionPattern::new(
                    r"(?i)made\s*a\s*transaction\s*of\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*your\s*HDFC\s*Bank\s*.*?(?:Card)\s*(?:.*?|x*|X*)(\d+)\s*at\s*(.*?)\s*on\s*([\d-]+)(?:.*?Ref[:\.\s]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Spent
                TransactionPattern::new(
                    r"(?i)spent\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*.*?card\s*(?:.*?|x*|X*)(\d+)\s*at\s*(.*?)\s*(?:on|Date)\s*([\d/-]+)(?:.*?Ref[:\.\s]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Account Debit
                TransactionPattern::new(
                    r"(?i)A/c\s*(?:.*?|x*|X*)(\d+)\s*has\s*been\s*debited\s*for\s*(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*on\s*([\d-]+)\s*towards\s*(.*?)(?:\.\s*Ref[:\s]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_MASK, 1), (FIELD_AMOUNT, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // UPI Debit
                TransactionPattern::new(
                    r"(?i)(?:Rs\.?|INR)\s*([\d,]+\.?\d*)\s*has\s*been\s*debited\s*from\s*account\s*(\d+)\s*to\s*(.*?)\s*on\s*([\d-]+)(?:.*?\b(?:Ref|Reference)\s*(?:No|ID|Number)?(?:[\s:\.-]|\bis\b)+([a-zA-Z0-9]+))?",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Generic UPI
                TransactionPattern::new(
                    r"(?i)UPI\s*txn.*?([\d,]+\.?\d*)\s*debited\s*from\s*A/c\s*(?:.*?|x*|X*)(\d+)\s*to\s*(.*?)\s*on\s*([\d-]+)(?:.*?\b(?:Ref|Reference)\s*(?:No|ID|Number)?(?:[\s:\.-]|\bis\b)+([a-zA-Z0-9]+))?",
                    1.0,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
            ],
        }
    }
}

impl BankParser for HdfcParser {
    fn name(&self) -> &'static str {
        "HDFC"
    }

    fn can_handle(&self, sender: &str, content: &str) -> bool {
        sender.to_lowercase().contains("hdfc") || content.to_lowercase().contains("hdfc")
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
    fn matches_literal_sent_sms_scenario() {
        let parser = HdfcParser::new();
        let text = "Sent Rs.70.00 From HDFC Bank A/C *5244 To Mr SIDHARTHA SWAIN On 09/01/26 Ref 116929657356";
        assert!(parser.can_handle("HDFCBK", text));
        let now = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();
        let candidates: Vec<_> = parser
            .patterns_for(Source::Sms)
            .iter()
            .filter_map(|p| evaluate_pattern(p, text, text, None, now))
            .collect();
        assert!(candidates.iter().any(|c| c.ref_id == "116929657356"));
    }
}
