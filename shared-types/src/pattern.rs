use crate::financial::Source;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A persisted, user- or AI-learned regex for extracting transactions from text.
///
/// Invariants (enforced by the pattern store, not by this type): `regex` compiles,
/// every index in `field_mapping` is within the regex's capture-group count, and
/// `(source, regex)` is unique among active rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRule {
    pub id: i64,
    pub source: Source,
    pub regex: String,
    pub field_mapping: HashMap<String, usize>,
    pub confidence: f32,
    pub is_ai_generated: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatternRuleRequest {
    pub source: Source,
    pub regex: String,
    pub field_mapping: HashMap<String, usize>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatternRuleRequest {
    pub regex: Option<String>,
    pub field_mapping: Option<HashMap<String, usize>>,
    pub confidence: Option<f32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPatternsQuery {
    pub source: Option<Source>,
    pub is_ai_generated: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestPatternRequest {
    pub regex: String,
    pub field_mapping: HashMap<String, usize>,
    pub test_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestPatternResponse {
    pub matched: bool,
    pub extracted: HashMap<String, String>,
    pub errors: Vec<String>,
}
