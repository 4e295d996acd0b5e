use serde::{Deserialize, Serialize};

/// Singleton row describing the external LLM used for AI fallback (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIConfig {
    pub provider: String,
    pub model_name: String,
    pub api_key: Option<String>,
    pub is_enabled: bool,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model_name: "gemini-1.5-flash".to_string(),
            api_key: None,
            is_enabled: false,
        }
    }
}

/// What `/v1/config/ai` GET returns. The key is never echoed, only its last-4 suffix.
#[derive(Debug, Clone, Serialize)]
pub struct AIConfigView {
    pub provider: String,
    pub model_name: String,
    pub is_enabled: bool,
    pub masked_api_key: Option<String>,
}

pub fn mask_api_key_suffix(key: &str) -> String {
    if key.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", &key[key.len() - 4..])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAIConfigRequest {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub is_enabled: Option<bool>,
}
