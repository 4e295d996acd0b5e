use super::BankParser;
use crate::pattern_engine::{
    TransactionPattern, FIELD_AMOUNT, FIELD_DATE, FIELD_MASK, FIELD_RECIPIENT, FIELD_REF_ID,
};
use shared_types::{Source, TransactionType};

pub struct AxisParser {
    sms_patterns: Vec<TransactionPattern>,
}

impl AxisParser {
    pub fn new() -> Self {
        Self {
            sms_patterns: vec![
                // Spent
                TransactionPattern::new(
                    r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*spent\s*on\s*Axis\s*Bank\s*.*?(?:Card|A/c)\s*([xX]*\d+)\s*at\s*(.*?)\s*on\s*([\d-]+)(?:.*?[Rr]ef[:\.\s-]+(\w+))?",
                    0.95,
                    TransactionType::Debit,
                    [(FIELD_AMOUNT, 1), (FIELD_MASK, 2), (FIELD_RECIPIENT, 3), (FIELD_DATE, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
                // Debit
                TransactionPattern::new(
                    r"(?i)A/c\s*([xX]*\d+)\s*is\s*debited\s*for\s*(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*on\s*([\d-]+)\.\s*Info:\s*(.*?)(?:.*?[Rr]ef[:\.\s-]+(\w+))?",
                    0.9,
                    TransactionType::Debit,
                    [(FIELD_MASK, 1), (FIELD_AMOUNT, 2), (FIELD_DATE, 3), (FIELD_RECIPIENT, 4), (FIELD_REF_ID, 5)].into_iter().collect(),
                ),
            ],
        }
    }
}

impl BankParser for AxisParser {
    fn name(&self) -> &'static str {
        "Axis"
    }

    fn can_handle(&self, sender: &str, content: &str) -> bool {
        sender.to_lowercase().contains("axis") || content.to_lowercase().contains("axis")
    }

    fn patterns_for(&self, _source: Source) -> &[TransactionPattern] {
        // Axis's email alerts are parsed by re-running the SMS pattern list
        // in the original source; there is no separate email pattern set.
        &self.sms_patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_engine::evaluate_pattern;
    use chrono::{TimeZone, Utc};

    #[test]
    fn matches_spent_sms() {
        let parser = AxisParser::new();
        let text = "INR 1,250.00 spent on Axis Bank Card XX7781 at Big Bazaar on 12-07-2025 Ref 998877";
        assert!(parser.can_handle("AXISBK", text));
        let now = Utc.with_ymd_and_hms(2025, 7, 12, 12, 0, 0).unwrap();
        let hits: Vec<_> = parser
            .patterns_for(Source::Sms)
            .iter()
            .filter_map(|p| evaluate_pattern(p, text, text, None, now))
            .collect();
        let best = hits.iter().max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap()).unwrap();
        assert_eq!(best.account.mask, Some("7781".to_string()));
        assert_eq!(best.ref_id, "998877");
    }
}
