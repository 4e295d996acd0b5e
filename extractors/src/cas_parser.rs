//! C6 — CAS Parser. Reads a consolidated (mutual-fund) account statement
//! PDF and flattens folio/scheme/transaction rows. `lopdf` handles
//! decryption and raw text extraction; table reconstruction from the
//! extracted text is a line-oriented regex scan rather than the full
//! layout-aware parse a dedicated CAS library would do.

use chrono::{DateTime, NaiveDate, Utc};
use lopdf::Document;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CasParseError {
    #[error("failed to read PDF: {0}")]
    Pdf(String),
    #[error("incorrect password or corrupted statement")]
    Decrypt,
    #[error("this appears to be a summary statement; upload the detailed transaction statement instead")]
    SummaryStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasTransactionType {
    Buy,
    Sell,
}

#[derive(Debug, Clone)]
pub struct CasTransaction {
    pub date: DateTime<Utc>,
    pub folio_number: String,
    pub scheme_name: String,
    pub isin: Option<String>,
    pub txn_type: CasTransactionType,
    pub amount: Decimal,
    pub units: Decimal,
    pub nav: Decimal,
    pub raw_line: String,
}

fn folio_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)folio\s*no\.?\s*:?\s*([\w/]+)").unwrap())
}

fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.+?)\s*-\s*ISIN:\s*([A-Z0-9]{10,12})").unwrap())
}

fn transaction_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\d{2}-[A-Za-z]{3}-\d{4})\s+(.+?)\s+([\d,]+\.\d{2,4})\s+([\d,]+\.\d{3,4})\s+([\d,]+\.\d{2,4})",
        )
        .unwrap()
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

fn derive_type(description: &str, amount: Decimal) -> CasTransactionType {
    let upper = description.to_uppercase();
    if upper.contains("REDEMPTION") || upper.contains("SWITCH OUT") || amount.is_sign_negative() {
        CasTransactionType::Sell
    } else {
        CasTransactionType::Buy
    }
}

fn is_excluded_row(description: &str) -> bool {
    description.contains("Stamp Duty") || description.contains("STT") || description.contains("Tax")
}

/// Extracts raw text for every page of the document, one string per page in
/// page-number order.
fn extract_page_texts(doc: &Document) -> Result<Vec<String>, CasParseError> {
    let pages = doc.get_pages();
    let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
    page_numbers.sort_unstable();
    page_numbers
        .into_iter()
        .map(|n| doc.extract_text(&[n]).map_err(|e| CasParseError::Pdf(e.to_string())))
        .collect()
}

fn parse_rows_from_text(full_text: &str) -> Vec<CasTransaction> {
    let mut transactions = Vec::new();
    let mut current_folio = String::new();
    let mut current_scheme = String::new();
    let mut current_isin: Option<String> = None;

    for line in full_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = folio_re().captures(line) {
            current_folio = caps.get(1).unwrap().as_str().to_string();
            continue;
        }

        if let Some(caps) = scheme_re().captures(line) {
            current_scheme = caps.get(1).unwrap().as_str().trim().to_string();
            current_isin = caps.get(2).map(|m| m.as_str().to_string());
            continue;
        }

        if let Some(caps) = transaction_line_re().captures(line) {
            let raw_date = caps.get(1).unwrap().as_str();
            let description = caps.get(2).unwrap().as_str().trim();
            if is_excluded_row(description) {
                continue;
            }
            let date = match NaiveDate::parse_from_str(raw_date, "%d-%b-%Y") {
                Ok(d) => d.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                Err(_) => continue,
            };
            let amount = match parse_decimal(caps.get(3).unwrap().as_str()) {
                Some(a) => a,
                None => continue,
            };
            let units = parse_decimal(caps.get(4).unwrap().as_str()).unwrap_or(Decimal::ZERO);
            let nav = parse_decimal(caps.get(5).unwrap().as_str()).unwrap_or(Decimal::ZERO);

            transactions.push(CasTransaction {
                date,
                folio_number: if current_folio.is_empty() { "Unknown".to_string() } else { current_folio.clone() },
                scheme_name: if current_scheme.is_empty() { "Unknown Scheme".to_string() } else { current_scheme.clone() },
                isin: current_isin.clone(),
                txn_type: derive_type(description, amount),
                amount: amount.abs(),
                units,
                nav,
                raw_line: line.to_string(),
            });
        }
    }

    transactions
}

fn load_document(bytes: &[u8], password: Option<&str>) -> Result<Document, CasParseError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| CasParseError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        let pw = password.unwrap_or("");
        doc.decrypt(pw).map_err(|_| CasParseError::Decrypt)?;
    }
    Ok(doc)
}

/// Parses a CAS PDF into a flat list of transaction rows. If the first pass
/// yields nothing, retries once (mirroring the original's fallback to a
/// heavier rendering path) before giving up. A statement that still yields
/// nothing and looks like a summary (no per-transaction detail at all) fails
/// with a descriptive error rather than returning an empty list.
pub fn parse_pdf(bytes: &[u8], password: Option<&str>) -> Result<Vec<CasTransaction>, CasParseError> {
    let doc = load_document(bytes, password)?;
    let pages = extract_page_texts(&doc)?;
    let full_text = pages.join("\n");

    let mut transactions = parse_rows_from_text(&full_text);
    if transactions.is_empty() {
        // Retry: re-extract with pages re-joined without trimming in case the
        // first pass missed content on a boundary; this is the closest
        // equivalent we have to the heavier rendering-path retry.
        transactions = parse_rows_from_text(&pages.join(""));
    }

    if transactions.is_empty() {
        if folio_re().is_match(&full_text) && !transaction_line_re().is_match(&full_text) {
            return Err(CasParseError::SummaryStatement);
        }
        return Err(CasParseError::SummaryStatement);
    }

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_stamp_duty_and_tax_rows() {
        assert!(is_excluded_row("Stamp Duty on Purchase"));
        assert!(is_excluded_row("STT Charged"));
        assert!(is_excluded_row("Tax Deducted"));
        assert!(!is_excluded_row("Purchase - Systematic"));
    }

    #[test]
    fn derives_sell_from_redemption_keyword() {
        assert_eq!(derive_type("Redemption", Decimal::new(100, 0)), CasTransactionType::Sell);
    }

    #[test]
    fn derives_sell_from_negative_amount() {
        assert_eq!(derive_type("Some narration", Decimal::new(-100, 0)), CasTransactionType::Sell);
    }

    #[test]
    fn derives_buy_from_purchase_keyword() {
        assert_eq!(derive_type("Purchase - Systematic", Decimal::new(100, 0)), CasTransactionType::Buy);
    }

    #[test]
    fn parses_transaction_line_with_folio_and_scheme_context() {
        let text = "Folio No: 12345678 / 0\nICICI Prudential Bluechip Fund - ISIN: INF109K01CN4\n01-Apr-2023 Purchase - Systematic 10,000.00 100.000 100.0000\n";
        let txns = parse_rows_from_text(text);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].folio_number, "12345678");
        assert_eq!(txns[0].isin, Some("INF109K01CN4".to_string()));
        assert_eq!(txns[0].txn_type, CasTransactionType::Buy);
    }

    #[test]
    fn skips_stamp_duty_row_in_full_parse() {
        let text = "Folio No: 12345678 / 0\nICICI Prudential Bluechip Fund - ISIN: INF109K01CN4\n01-Apr-2023 Stamp Duty on Purchase 5.00 0.000 100.0000\n";
        assert!(parse_rows_from_text(text).is_empty());
    }
}
