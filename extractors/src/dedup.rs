//! C9 — Deduplicator (comparison logic only). Layer 1 (submission
//! idempotency via `RequestLog.input_hash`) and the 15-minute scan window
//! live in the pipeline orchestrator, which has the database connection;
//! this module supplies the pure predicates the orchestrator applies to
//! each candidate pair.

use shared_types::Transaction;

const FUZZY_MATCH_THRESHOLD: u8 = 90;

/// Strips leading zeros before comparing ref ids, so "0012345" and "12345"
/// still match. An empty ref id never matches anything (both sides must
/// have carried a real reference).
pub fn ref_id_matches(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    !a.is_empty() && a == b
}

fn last4_digits(mask: Option<&str>) -> Option<String> {
    let mask = mask?;
    let digits: String = mask.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        None
    } else {
        Some(digits[digits.len() - 4..].to_string())
    }
}

/// Highest-priority check: a ref-id match (leading zeros stripped) on its
/// own is decisive.
pub fn is_ref_id_duplicate(a: &Transaction, b: &Transaction) -> bool {
    !a.ref_id.is_empty() && !b.ref_id.is_empty() && ref_id_matches(&a.ref_id, &b.ref_id)
}

/// Composite fuzzy match: exact amount, exact direction, matching last-4
/// mask on both sides, and a merchant/description partial-ratio ≥ 90.
pub fn is_fuzzy_duplicate(a: &Transaction, b: &Transaction) -> bool {
    if a.amount != b.amount || a.txn_type != b.txn_type {
        return false;
    }

    let a_mask = last4_digits(a.account.mask.as_deref());
    let b_mask = last4_digits(b.account.mask.as_deref());
    match (a_mask, b_mask) {
        (Some(x), Some(y)) if x == y => {}
        _ => return false,
    }

    let a_text = if a.merchant.cleaned.is_empty() { &a.description } else { &a.merchant.cleaned };
    let b_text = if b.merchant.cleaned.is_empty() { &b.description } else { &b.merchant.cleaned };
    partial_ratio(a_text, b_text) >= FUZZY_MATCH_THRESHOLD
}

/// True if either the ref-id or the fuzzy composite check marks the pair as
/// duplicates of each other.
pub fn is_duplicate(a: &Transaction, b: &Transaction) -> bool {
    is_ref_id_duplicate(a, b) || is_fuzzy_duplicate(a, b)
}

/// rapidfuzz-style partial ratio: the best Levenshtein similarity of the
/// shorter string against any equal-length window of the longer string,
/// expressed as an integer 0-100. Tolerant of one string being a substring
/// or truncated/padded variant of the other, unlike a plain ratio.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 100 } else { 0 };
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() { (&a, &b) } else { (&b, &a) };
    let shorter_chars: Vec<char> = shorter.chars().collect();
    let longer_chars: Vec<char> = longer.chars().collect();
    let window = shorter_chars.len();

    if window >= longer_chars.len() {
        return ratio(shorter, longer);
    }

    let mut best = 0u8;
    for start in 0..=(longer_chars.len() - window) {
        let slice: String = longer_chars[start..start + window].iter().collect();
        let score = ratio(shorter, &slice);
        if score > best {
            best = score;
        }
        if best == 100 {
            break;
        }
    }
    best
}

fn ratio(a: &str, b: &str) -> u8 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100;
    }
    let distance = strsim::levenshtein(a, b);
    let similarity = 1.0 - (distance as f64 / max_len as f64);
    (similarity.max(0.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared_types::{Account, Merchant, TransactionType};

    fn txn(amount: &str, mask: &str, merchant: &str, ref_id: &str) -> Transaction {
        Transaction {
            amount: amount.parse::<Decimal>().unwrap(),
            txn_type: TransactionType::Debit,
            date: chrono::Utc::now(),
            currency: "INR".to_string(),
            account: Account { mask: Some(mask.to_string()), provider: None },
            merchant: Merchant { raw: merchant.to_string(), cleaned: merchant.to_string() },
            description: merchant.to_string(),
            recipient: merchant.to_string(),
            ref_id: ref_id.to_string(),
            balance: None,
            credit_limit: None,
            category: None,
            raw_message: String::new(),
            confidence: 1.0,
        }
    }

    #[test]
    fn ref_id_strips_leading_zeros() {
        assert!(ref_id_matches("0012345", "12345"));
        assert!(!ref_id_matches("", ""));
    }

    #[test]
    fn partial_ratio_handles_substring() {
        assert_eq!(partial_ratio("sidhartha", "sent to sidhartha swain"), 100);
    }

    #[test]
    fn partial_ratio_identical_strings() {
        assert_eq!(partial_ratio("amazon", "amazon"), 100);
    }

    #[test]
    fn fuzzy_duplicate_requires_matching_mask_and_amount() {
        let a = txn("70.00", "XX5244", "SIDHARTHA SWAIN", "");
        let b = txn("70.00", "XX5244", "UPI SIDHARTHA SWAIN", "");
        assert!(is_fuzzy_duplicate(&a, &b));
    }

    #[test]
    fn fuzzy_duplicate_rejects_mismatched_amount() {
        let a = txn("70.00", "XX5244", "SIDHARTHA SWAIN", "");
        let b = txn("75.00", "XX5244", "SIDHARTHA SWAIN", "");
        assert!(!is_fuzzy_duplicate(&a, &b));
    }

    #[test]
    fn ref_id_duplicate_wins_even_with_different_merchant_text() {
        let a = txn("70.00", "XX5244", "SIDHARTHA SWAIN", "116929657356");
        let b = txn("70.00", "XX5244", "completely different text", "116929657356");
        assert!(is_duplicate(&a, &b));
    }
}
