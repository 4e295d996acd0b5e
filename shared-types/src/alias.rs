use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator-managed merchant alias: if `pattern` matches a recipient/description
/// (case-insensitive substring or regex), the normalizer returns `alias` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantAlias {
    pub id: i64,
    pub pattern: String,
    pub alias: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAliasRequest {
    pub pattern: String,
    pub alias: String,
}
