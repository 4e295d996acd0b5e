//! C8 — Validator/Enricher. Runs after normalization: attaches non-fatal
//! warnings to a transaction and fills in a missing time-of-day component.
//! Nothing here rejects a transaction outright — that's the orchestrator's
//! job once it has a confidence score to weigh these warnings against.

use chrono::{DateTime, Duration, Timelike, Utc};
use shared_types::Transaction;

/// Non-fatal warnings: a future-dated transaction (beyond a one-day
/// timezone buffer) or a currency mismatch between the parsed currency and
/// a different currency symbol/code found in the raw text.
pub fn validate(txn: &Transaction, raw_content: &str, now: DateTime<Utc>) -> Vec<String> {
    let mut warnings = Vec::new();

    if txn.date > now + Duration::days(1) {
        warnings.push(format!(
            "Future date detected: {}. This might be a parsing error.",
            txn.date
        ));
    }

    if txn.currency == "INR" {
        let raw_upper = raw_content.to_uppercase();
        if raw_upper.contains("USD") || raw_upper.contains('$') {
            warnings.push("Potential currency mismatch: USD detected in text but parsed as INR.".to_string());
        } else if raw_upper.contains("EUR") || raw_upper.contains("EURO") {
            warnings.push("Potential currency mismatch: EUR detected in text but parsed as INR.".to_string());
        }
    }

    warnings
}

/// If a transaction's date falls on today but carries no time-of-day (a
/// parser defaulted to midnight), stamp it with the current wall-clock time
/// so same-day transactions still sort by ingestion order.
pub fn enrich_time(txn: &mut Transaction, now: DateTime<Utc>) {
    if txn.date.date_naive() == now.date_naive()
        && txn.date.hour() == 0
        && txn.date.minute() == 0
        && txn.date.second() == 0
    {
        txn.date = txn
            .date
            .with_hour(now.hour())
            .and_then(|d| d.with_minute(now.minute()))
            .and_then(|d| d.with_second(now.second()))
            .unwrap_or(txn.date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use shared_types::{Account, Merchant, TransactionType};

    fn sample_txn(date: DateTime<Utc>) -> Transaction {
        Transaction {
            amount: Decimal::new(100, 0),
            txn_type: TransactionType::Debit,
            date,
            currency: "INR".to_string(),
            account: Account::default(),
            merchant: Merchant::default(),
            description: String::new(),
            recipient: String::new(),
            ref_id: String::new(),
            balance: None,
            credit_limit: None,
            category: None,
            raw_message: String::new(),
            confidence: 1.0,
        }
    }

    #[test]
    fn flags_future_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let txn = sample_txn(now + Duration::days(5));
        let warnings = validate(&txn, "", now);
        assert!(warnings.iter().any(|w| w.contains("Future date")));
    }

    #[test]
    fn flags_usd_mismatch() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let txn = sample_txn(now);
        let warnings = validate(&txn, "Paid $50 to Store", now);
        assert!(warnings.iter().any(|w| w.contains("USD")));
    }

    #[test]
    fn no_warnings_for_clean_transaction() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let txn = sample_txn(now);
        assert!(validate(&txn, "Rs.100 debited", now).is_empty());
    }

    #[test]
    fn enriches_midnight_same_day_with_current_time() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 15, 30, 45).unwrap();
        let mut txn = sample_txn(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        enrich_time(&mut txn, now);
        assert_eq!(txn.date.hour(), 15);
        assert_eq!(txn.date.minute(), 30);
    }

    #[test]
    fn leaves_non_midnight_time_untouched() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 15, 30, 45).unwrap();
        let original = Utc.with_ymd_and_hms(2026, 1, 1, 9, 15, 0).unwrap();
        let mut txn = sample_txn(original);
        enrich_time(&mut txn, now);
        assert_eq!(txn.date, original);
    }
}
