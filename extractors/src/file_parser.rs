//! C5 — File Parser. CSV/XLSX ingestion via a header-row detection heuristic
//! (§4.5) plus an operator-supplied column mapping. Files that aren't one
//! of these two formats are rejected before this module is ever reached
//! (see the orchestrator's `InputRejected` path).

use crate::amount_parse::clean_amount_with_suffix;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared_types::{Account, FileAnalysis, FileFormat, FileParsingConfig, Merchant, Transaction, TransactionType};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileParseError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("file has no rows to analyze")]
    Empty,
}

const HEADER_KEYWORDS: &[&str] = &[
    "date", "txn", "transaction", "valuedate", "description", "desc", "particulars", "narration",
    "remark", "amount", "debit", "credit", "dr", "cr", "balance", "bal", "limit", "ref",
];

fn format_from_filename(filename: &str) -> Result<FileFormat, FileParseError> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".csv") {
        Ok(FileFormat::Csv)
    } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
        Ok(FileFormat::Excel)
    } else {
        Err(FileParseError::UnsupportedFormat(filename.to_string()))
    }
}

fn read_rows_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, FileParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(bytes));
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(rows)
}

fn read_rows_xlsx(bytes: &[u8]) -> Result<Vec<Vec<String>>, FileParseError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| FileParseError::Spreadsheet(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FileParseError::Spreadsheet("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| FileParseError::Spreadsheet(e.to_string()))?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.to_string()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

fn read_rows(bytes: &[u8], format: FileFormat) -> Result<Vec<Vec<String>>, FileParseError> {
    match format {
        FileFormat::Csv => read_rows_csv(bytes),
        FileFormat::Excel => read_rows_xlsx(bytes),
    }
}

/// Scores each of the first 30 rows against a keyword set and picks the
/// best-scoring row as the header. Falls back to row 0 when nothing scores.
pub fn analyze(bytes: &[u8], filename: &str) -> Result<FileAnalysis, FileParseError> {
    let format = format_from_filename(filename)?;
    let rows = read_rows(bytes, format)?;
    if rows.is_empty() {
        return Err(FileParseError::Empty);
    }

    let scan_limit = rows.len().min(30);
    let mut best_idx = 0usize;
    let mut max_score = 0i32;
    let mut detected_headers: Vec<String> = Vec::new();

    for (idx, row) in rows.iter().take(scan_limit).enumerate() {
        let lowered: Vec<String> = row.iter().filter(|v| !v.is_empty()).map(|v| v.to_lowercase()).collect();
        let mut score = lowered
            .iter()
            .filter(|v| HEADER_KEYWORDS.contains(&v.as_str()))
            .count() as i32;
        if lowered.iter().any(|v| v.contains("date")) {
            score += 1;
        }
        if lowered.iter().any(|v| v.contains("amount") || v.contains("debit")) {
            score += 1;
        }
        if score > max_score {
            max_score = score;
            best_idx = idx;
            detected_headers = row.iter().filter(|v| !v.is_empty()).cloned().collect();
        }
    }

    if max_score < 1 {
        best_idx = 0;
        detected_headers = rows[0].iter().filter(|v| !v.is_empty()).cloned().collect();
    }

    let preview_rows = rows
        .iter()
        .skip(best_idx + 1)
        .take(5)
        .map(|row| {
            let mut map = HashMap::new();
            for (col_idx, header) in detected_headers.iter().enumerate() {
                map.insert(header.clone(), row.get(col_idx).cloned().unwrap_or_default());
            }
            map
        })
        .collect();

    Ok(FileAnalysis {
        header_row_index: best_idx,
        headers: detected_headers,
        preview: preview_rows,
    })
}

/// Parses rows into transactions using an operator-confirmed column mapping
/// (`config.columns`: canonical field name -> actual header text). Rows
/// that fail to yield a usable date or a nonzero amount are skipped rather
/// than aborting the whole file.
pub fn parse(
    bytes: &[u8],
    filename: &str,
    config: &FileParsingConfig,
    date_hint: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Vec<Transaction>, FileParseError> {
    let format = format_from_filename(filename)?;
    let rows = read_rows(bytes, format)?;
    if rows.len() <= config.header_row_index {
        return Ok(Vec::new());
    }

    let headers = &rows[config.header_row_index];
    let header_index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let get = |row: &[String], canonical: &str| -> Option<String> {
        let column_name = config.columns.get(canonical)?;
        let idx = *header_index.get(column_name.as_str())?;
        row.get(idx).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };

    let mut transactions = Vec::new();

    for row in rows.iter().skip(config.header_row_index + 1) {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let raw_date = match get(row, "date") {
            Some(d) => d,
            None => continue,
        };
        let date = match parse_file_date(&raw_date) {
            Some(d) => d,
            None => continue,
        };

        let description = get(row, "description").unwrap_or_else(|| "No Description".to_string());

        let (amount, txn_type) = if config.columns.contains_key("amount") {
            match get(row, "amount").and_then(|raw| signed_amount(&raw)) {
                Some(v) => v,
                None => continue,
            }
        } else if config.columns.contains_key("debit") && config.columns.contains_key("credit") {
            let debit = get(row, "debit").and_then(|raw| clean_amount_with_suffix(&raw)).map(|(a, _)| a);
            let credit = get(row, "credit").and_then(|raw| clean_amount_with_suffix(&raw)).map(|(a, _)| a);
            match (debit, credit) {
                (Some(d), _) if d > Decimal::ZERO => (d, TransactionType::Debit),
                (_, Some(c)) if c > Decimal::ZERO => (c, TransactionType::Credit),
                _ => continue,
            }
        } else {
            continue;
        };

        if amount.is_zero() {
            continue;
        }

        let ref_id = get(row, "reference").or_else(|| get(row, "ref")).unwrap_or_default();
        let balance = get(row, "balance").and_then(|raw| clean_amount_with_suffix(&raw)).map(|(a, _)| a);

        transactions.push(Transaction {
            amount,
            txn_type,
            date,
            currency: "INR".to_string(),
            account: Account { mask: Some("XXXX".to_string()), provider: Some("Imported".to_string()) },
            merchant: Merchant { raw: description.clone(), cleaned: description.clone() },
            description: description.clone(),
            recipient: description,
            ref_id,
            balance,
            credit_limit: None,
            category: None,
            raw_message: row.join(","),
            confidence: 1.0,
        });
    }

    let _ = date_hint;
    let _ = now;
    Ok(transactions)
}

fn signed_amount(raw: &str) -> Option<(Decimal, TransactionType)> {
    if let Some((amount, Some(ty))) = clean_amount_with_suffix(raw) {
        return Some((amount, ty));
    }
    let signed = crate::amount_parse::clean_amount(raw)?;
    if signed.is_sign_negative() {
        Some((signed.abs(), TransactionType::Debit))
    } else {
        Some((signed, TransactionType::Credit))
    }
}

const FILE_DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y", "%Y-%m-%d", "%Y/%m/%d"];

fn parse_file_date(raw: &str) -> Option<DateTime<Utc>> {
    for fmt in FILE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    crate::date_parse::try_parse_date(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(columns: &[(&str, &str)]) -> FileParsingConfig {
        FileParsingConfig {
            fingerprint: "test".to_string(),
            format: FileFormat::Csv,
            header_row_index: 0,
            columns: columns.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn analyzes_csv_with_obvious_header() {
        let csv = "Date,Description,Amount,Balance\n01-01-2026,Coffee Shop,-150.00,5000.00\n";
        let analysis = analyze(csv.as_bytes(), "statement.csv").unwrap();
        assert_eq!(analysis.header_row_index, 0);
        assert_eq!(analysis.headers, vec!["Date", "Description", "Amount", "Balance"]);
    }

    #[test]
    fn parses_signed_amount_column() {
        let csv = "Date,Description,Amount,Balance\n01-01-2026,Coffee Shop,-150.00,5000.00\n15-02-2026,Salary,20000.00,25000.00\n";
        let config = sample_config(&[("date", "Date"), ("description", "Description"), ("amount", "Amount"), ("balance", "Balance")]);
        let now = Utc::now();
        let txns = parse(csv.as_bytes(), "statement.csv", &config, None, now).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].txn_type, TransactionType::Debit);
        assert_eq!(txns[1].txn_type, TransactionType::Credit);
    }

    #[test]
    fn parses_separate_debit_credit_columns() {
        let csv = "Date,Description,Debit,Credit\n01-01-2026,ATM Withdrawal,500.00,\n02-01-2026,Refund,,100.00\n";
        let config = sample_config(&[("date", "Date"), ("description", "Description"), ("debit", "Debit"), ("credit", "Credit")]);
        let now = Utc::now();
        let txns = parse(csv.as_bytes(), "statement.csv", &config, None, now).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, Decimal::new(50000, 2));
        assert_eq!(txns[1].txn_type, TransactionType::Credit);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let result = analyze(b"irrelevant", "statement.pdf");
        assert!(matches!(result, Err(FileParseError::UnsupportedFormat(_))));
    }
}
