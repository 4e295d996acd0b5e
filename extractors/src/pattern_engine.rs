//! Shared regex-evaluation engine behind both C2 (static bank parsers) and C3
//! (persisted pattern rules). A `TransactionPattern` is pure data: a compiled
//! regex plus a capture-group-to-field mapping. Evaluating one against a
//! message either yields a candidate `Transaction` or nothing — it never
//! raises, matching the "a parser set as a whole never raises" error policy.

use crate::amount_parse::{clean_amount, normalize_mask};
use crate::date_parse::parse_date;
use chrono::{DateTime, Utc};
use regex::Regex;
use shared_types::{Account, Merchant, Transaction, TransactionType};
use std::collections::HashMap;

/// Canonical field names recognized in a `field_map`. `credit_limit` extends
/// the base set so a pattern can capture a card's available limit alongside
/// the transaction amount (see end-to-end scenario 2).
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_DATE: &str = "date";
pub const FIELD_MASK: &str = "mask";
pub const FIELD_RECIPIENT: &str = "recipient";
pub const FIELD_REF_ID: &str = "ref_id";
pub const FIELD_BALANCE: &str = "balance";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_CREDIT_LIMIT: &str = "credit_limit";

#[derive(Debug, Clone)]
pub struct TransactionPattern {
    pub regex: Regex,
    pub confidence: f32,
    /// Declared direction. Ignored when the pattern also captures a `type`
    /// field, in which case the captured text ("credited"/"debited") wins.
    pub txn_type: TransactionType,
    pub field_map: HashMap<&'static str, usize>,
}

impl TransactionPattern {
    pub fn new(
        pattern: &str,
        confidence: f32,
        txn_type: TransactionType,
        field_map: HashMap<&'static str, usize>,
    ) -> Self {
        Self {
            regex: Regex::new(pattern).expect("bank parser regex must be valid"),
            confidence,
            txn_type,
            field_map,
        }
    }
}

/// Evaluates a single pattern against `text`. `parser_name` and
/// `source_original` are stamped onto the candidate's metadata by the caller;
/// here we only build the `Transaction` itself.
pub fn evaluate_pattern(
    pattern: &TransactionPattern,
    text: &str,
    raw_message: &str,
    date_hint: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<Transaction> {
    let captures = pattern.regex.captures(text)?;

    let amount_group = *pattern.field_map.get(FIELD_AMOUNT)?;
    let amount_raw = captures.get(amount_group)?.as_str();
    let amount = clean_amount(amount_raw)?;
    if amount.is_sign_negative() || amount.is_zero() {
        return None;
    }

    let date = pattern
        .field_map
        .get(FIELD_DATE)
        .and_then(|g| captures.get(*g))
        .map(|m| parse_date(m.as_str(), date_hint, now))
        .unwrap_or_else(|| date_hint.unwrap_or(now));

    let mask = pattern
        .field_map
        .get(FIELD_MASK)
        .and_then(|g| captures.get(*g))
        .and_then(|m| normalize_mask(m.as_str()));

    let recipient = pattern
        .field_map
        .get(FIELD_RECIPIENT)
        .and_then(|g| captures.get(*g))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let ref_id = pattern
        .field_map
        .get(FIELD_REF_ID)
        .and_then(|g| captures.get(*g))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let balance = pattern
        .field_map
        .get(FIELD_BALANCE)
        .and_then(|g| captures.get(*g))
        .and_then(|m| clean_amount(m.as_str()))
        .or_else(|| find_balance(text));

    let credit_limit = pattern
        .field_map
        .get(FIELD_CREDIT_LIMIT)
        .and_then(|g| captures.get(*g))
        .and_then(|m| clean_amount(m.as_str()))
        .or_else(|| find_credit_limit(text));

    let txn_type = pattern
        .field_map
        .get(FIELD_TYPE)
        .and_then(|g| captures.get(*g))
        .map(|m| derive_type_from_text(m.as_str()))
        .unwrap_or(pattern.txn_type);

    Some(Transaction {
        amount,
        txn_type,
        date,
        currency: "INR".to_string(),
        account: Account {
            mask,
            provider: None,
        },
        merchant: Merchant {
            raw: recipient.clone(),
            cleaned: recipient.clone(),
        },
        description: text.to_string(),
        recipient,
        ref_id,
        balance,
        credit_limit,
        category: None,
        raw_message: raw_message.to_string(),
        confidence: pattern.confidence,
    })
}

/// Separate free-text scans for balance/limit, mirroring the per-bank
/// `BAL_PATTERN`/`LIMIT_PATTERN` lookups layered on top of the main capture
/// groups (used e.g. by end-to-end scenario 2's "Avl Limit: INR ..." suffix).
fn find_balance(text: &str) -> Option<rust_decimal::Decimal> {
    static BAL: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = BAL.get_or_init(|| {
        Regex::new(r"(?i)\b(?:Avbl\s*Bal|Avl\s*Bal|Bal|Balance)[:\.\s-]+(?:Rs\.?|INR)\s*([\d,]+\.?\d*)").unwrap()
    });
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_amount(m.as_str()))
}

fn find_credit_limit(text: &str) -> Option<rust_decimal::Decimal> {
    static LIMIT: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = LIMIT.get_or_init(|| {
        Regex::new(r"(?i)\b(?:Avl\s*Limit|Credit\s*Limit|Limit)[:\.\s-]+(?:Rs\.?|INR)\s*([\d,]+\.?\d*)").unwrap()
    });
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_amount(m.as_str()))
}

fn derive_type_from_text(text: &str) -> TransactionType {
    let lower = text.to_lowercase();
    if lower.contains("credit") {
        TransactionType::Credit
    } else {
        TransactionType::Debit
    }
}

/// Validates a pattern rule the way the operator-facing API must before
/// accepting it into the pattern store (§4.3): the regex compiles and every
/// mapped group index is within the regex's capture-group count.
pub fn validate_field_mapping(
    regex: &Regex,
    field_mapping: &HashMap<String, usize>,
) -> Result<(), String> {
    let group_count = regex.captures_len();
    for (field, idx) in field_mapping {
        if *idx == 0 || *idx >= group_count {
            return Err(format!(
                "field '{field}' maps to group {idx}, but the regex has {} groups",
                group_count.saturating_sub(1)
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn field_map(pairs: &[(&'static str, usize)]) -> HashMap<&'static str, usize> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn builds_candidate_from_match() {
        let pattern = TransactionPattern::new(
            r"Sent Rs\.(\d+\.\d+) From HDFC Bank A/C \*(\d+) To Mr (\w+ \w+) On (\d{2}/\d{2}/\d{2}) Ref (\d+)",
            0.98,
            TransactionType::Debit,
            field_map(&[
                (FIELD_AMOUNT, 1),
                (FIELD_MASK, 2),
                (FIELD_RECIPIENT, 3),
                (FIELD_DATE, 4),
                (FIELD_REF_ID, 5),
            ]),
        );
        let text = "Sent Rs.70.00 From HDFC Bank A/C *5244 To Mr SIDHARTHA SWAIN On 09/01/26 Ref 116929657356";
        let now = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();
        let txn = evaluate_pattern(&pattern, text, text, None, now).unwrap();
        assert_eq!(txn.amount, rust_decimal::Decimal::new(7000, 2));
        assert_eq!(txn.account.mask, Some("5244".to_string()));
        assert_eq!(txn.ref_id, "116929657356");
        assert_eq!(txn.txn_type, TransactionType::Debit);
    }

    #[test]
    fn rejects_zero_amount() {
        let pattern = TransactionPattern::new(
            r"amount (\d+\.\d+)",
            0.9,
            TransactionType::Debit,
            field_map(&[(FIELD_AMOUNT, 1)]),
        );
        let now = Utc::now();
        assert!(evaluate_pattern(&pattern, "amount 0.00", "amount 0.00", None, now).is_none());
    }

    #[test]
    fn validates_group_bounds() {
        let re = Regex::new(r"(\d+)-(\d+)").unwrap();
        let mut mapping = HashMap::new();
        mapping.insert("amount".to_string(), 1usize);
        assert!(validate_field_mapping(&re, &mapping).is_ok());
        mapping.insert("ref_id".to_string(), 5usize);
        assert!(validate_field_mapping(&re, &mapping).is_err());
    }
}
