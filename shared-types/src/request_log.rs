use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestLogStatus {
    Processing,
    Success,
    Ignored,
    Failed,
    DuplicateSubmission,
    AnalysisRequired,
}

impl RequestLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestLogStatus::Processing => "processing",
            RequestLogStatus::Success => "success",
            RequestLogStatus::Ignored => "ignored",
            RequestLogStatus::Failed => "failed",
            RequestLogStatus::DuplicateSubmission => "duplicate_submission",
            RequestLogStatus::AnalysisRequired => "analysis_required",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "success" => Some(Self::Success),
            "ignored" => Some(Self::Ignored),
            "failed" => Some(Self::Failed),
            "duplicate_submission" => Some(Self::DuplicateSubmission),
            "analysis_required" => Some(Self::AnalysisRequired),
            _ => None,
        }
    }
}

/// Append-only audit row for every ingest call; pruned after 24h by a background sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLog {
    pub id: String,
    pub source: String,
    pub input_hash: String,
    pub input_payload: String,
    pub output_payload: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLogsQuery {
    pub source: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Clone, Serialize)]
pub struct LogListResponse {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub logs: Vec<RequestLog>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct StatsResponse {
    pub status_breakdown: std::collections::HashMap<String, i64>,
    pub source_breakdown: std::collections::HashMap<String, i64>,
    pub parser_performance: std::collections::HashMap<String, i64>,
}
