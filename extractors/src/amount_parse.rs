//! Amount and account-mask normalization shared by C2, C3 and C5.

use rust_decimal::Decimal;
use shared_types::TransactionType;
use std::str::FromStr;

/// Strips thousand separators and whitespace, then parses. Returns `None` if
/// nothing digit-like remains.
pub fn clean_amount(raw: &str) -> Option<Decimal> {
    let s = raw.replace(',', "").replace(' ', "");
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(&s).ok()
}

/// Handles suffix-style amounts such as `"1,250.00 Dr"` or `"500 Cr"`. The
/// `Dr` suffix inverts the sign (treated as a debit magnitude), `Cr` leaves it
/// positive. Returns `(magnitude, inferred_type)` when a sign-bearing suffix
/// was present, otherwise just the parsed magnitude with no type inference.
pub fn clean_amount_with_suffix(raw: &str) -> Option<(Decimal, Option<TransactionType>)> {
    let lower = raw.to_lowercase();
    let (body, inferred) = if let Some(stripped) = lower.strip_suffix("dr") {
        (stripped, Some(TransactionType::Debit))
    } else if let Some(stripped) = lower.strip_suffix("cr") {
        (stripped, Some(TransactionType::Credit))
    } else {
        (lower.as_str(), None)
    };
    let amount = clean_amount(body.trim())?;
    Some((amount.abs(), inferred))
}

/// Last 4 digits of the digit-only subsequence of `raw`, or `None` if fewer
/// than 4 digits are present.
pub fn normalize_mask(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        None
    } else {
        Some(digits[digits.len() - 4..].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousand_separators() {
        assert_eq!(
            clean_amount("2,39,131.00"),
            Some(Decimal::from_str("239131.00").unwrap())
        );
    }

    #[test]
    fn dr_suffix_marks_debit() {
        let (amount, ty) = clean_amount_with_suffix("1,250.00 Dr").unwrap();
        assert_eq!(amount, Decimal::from_str("1250.00").unwrap());
        assert_eq!(ty, Some(TransactionType::Debit));
    }

    #[test]
    fn cr_suffix_marks_credit() {
        let (amount, ty) = clean_amount_with_suffix("500 Cr").unwrap();
        assert_eq!(amount, Decimal::from(500));
        assert_eq!(ty, Some(TransactionType::Credit));
    }

    #[test]
    fn mask_takes_last_four_digits() {
        assert_eq!(normalize_mask("A/C *5244"), Some("5244".to_string()));
        assert_eq!(normalize_mask("XX0004"), Some("0004".to_string()));
        assert_eq!(normalize_mask("12"), None);
    }
}
