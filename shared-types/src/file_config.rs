use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    Csv,
    Excel,
}

/// Remembered column mapping for a recurring file shape, keyed by an opaque
/// fingerprint computed outside this service (typically bank+account derived).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileParsingConfig {
    pub fingerprint: String,
    pub format: FileFormat,
    pub header_row_index: usize,
    pub columns: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveFileMappingRequest {
    pub fingerprint: String,
    #[serde(default)]
    pub format: Option<FileFormat>,
    #[serde(default)]
    pub header_row_index: usize,
    pub columns: HashMap<String, String>,
}
