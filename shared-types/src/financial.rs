use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Direction of money movement on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Debit,
    Credit,
}

/// Channel a message arrived on. Mirrors `PatternRule::source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    Sms,
    Email,
    File,
    Cas,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Sms => "SMS",
            Source::Email => "EMAIL",
            Source::File => "FILE",
            Source::Cas => "CAS",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Masked account/card identity attached to a transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub mask: Option<String>,
    pub provider: Option<String>,
}

/// Merchant/counterparty text, both as parsed and after normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Merchant {
    pub raw: String,
    pub cleaned: String,
}

/// The canonical extraction output. One instance per detected money movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub txn_type: TransactionType,
    pub date: DateTime<Utc>,
    pub currency: String,
    pub account: Account,
    pub merchant: Merchant,
    pub description: String,
    pub recipient: String,
    pub ref_id: String,
    pub balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub category: Option<String>,
    pub raw_message: String,
    pub confidence: f32,
}

/// Status of a single extracted item within an IngestionResult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsedItemStatus {
    Extracted,
    CrossSourceDuplicate,
    Failed,
}

/// Bookkeeping alongside a parsed Transaction: who produced it and how sure they were.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedItemMetadata {
    pub parser_used: String,
    pub source_original: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedItem {
    pub status: ParsedItemStatus,
    pub transaction: Transaction,
    pub metadata: ParsedItemMetadata,
}

/// Top-level outcome of any one call into the pipeline orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Success,
    Ignored,
    DuplicateSubmission,
    AnalysisRequired,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    pub status: IngestionStatus,
    #[serde(default)]
    pub results: Vec<ParsedItem>,
    #[serde(default)]
    pub logs: Vec<String>,
    /// Populated only when `status == analysis_required`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FileAnalysis>,
}

impl IngestionResult {
    pub fn success(results: Vec<ParsedItem>, logs: Vec<String>) -> Self {
        Self {
            status: IngestionStatus::Success,
            results,
            logs,
            analysis: None,
        }
    }

    pub fn ignored(logs: Vec<String>) -> Self {
        Self {
            status: IngestionStatus::Ignored,
            results: Vec::new(),
            logs,
            analysis: None,
        }
    }

    pub fn duplicate_submission() -> Self {
        Self {
            status: IngestionStatus::DuplicateSubmission,
            results: Vec::new(),
            logs: vec!["duplicate submission within idempotency window".to_string()],
            analysis: None,
        }
    }

    pub fn failed(logs: Vec<String>) -> Self {
        Self {
            status: IngestionStatus::Failed,
            results: Vec::new(),
            logs,
            analysis: None,
        }
    }

    pub fn analysis_required(analysis: FileAnalysis, logs: Vec<String>) -> Self {
        Self {
            status: IngestionStatus::AnalysisRequired,
            results: Vec::new(),
            logs,
            analysis: Some(analysis),
        }
    }
}

/// Header-row detection result returned by the file analyze step (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub header_row_index: usize,
    pub headers: Vec<String>,
    pub preview: Vec<HashMap<String, String>>,
}
