//! C1 — Classifier. Rejects non-financial content before any parser runs.

const KEYWORDS: &[&str] = &[
    "debited", "credited", "spent", "txn", "upi", "payment", "card", "a/c", "inr", "rs.",
];

/// Pure, allocation-free (beyond the lowercase view) heuristic over message text.
/// False-negatives are acceptable; false-positives simply fail to match in C2/C3.
pub fn is_financial(content: &str) -> bool {
    let lower = content.to_lowercase();
    KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_debit_keyword() {
        assert!(is_financial("Your A/c XX5244 has been debited for Rs 70.00"));
    }

    #[test]
    fn rejects_unrelated_text() {
        assert!(!is_financial("Your OTP for login is 482913, valid for 10 minutes."));
    }

    #[test]
    fn case_insensitive() {
        assert!(is_financial("INR 869.00 SPENT using ICICI Bank Card"));
    }
}
