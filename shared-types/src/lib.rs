use serde::{Deserialize, Serialize};

pub mod ai_config;
pub mod alias;
pub mod file_config;
pub mod financial;
pub mod pattern;
pub mod request_log;

pub use ai_config::{mask_api_key_suffix, AIConfig, AIConfigView, UpdateAIConfigRequest};
pub use alias::{CreateAliasRequest, MerchantAlias};
pub use file_config::{FileFormat, FileParsingConfig, SaveFileMappingRequest};
pub use financial::{
    Account, FileAnalysis, IngestionResult, IngestionStatus, Merchant, ParsedItem,
    ParsedItemMetadata, ParsedItemStatus, Source, Transaction, TransactionType,
};
pub use pattern::{
    CreatePatternRuleRequest, ListPatternsQuery, PatternRule, TestPatternRequest,
    TestPatternResponse, UpdatePatternRuleRequest,
};
pub use request_log::{
    ListLogsQuery, LogListResponse, RequestLog, RequestLogStatus, StatsResponse,
};

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
