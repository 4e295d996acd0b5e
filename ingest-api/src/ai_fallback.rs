//! C4 — AI Fallback. Invoked by the orchestrator when no regex candidate
//! reaches the 0.9 confidence threshold. Talks to an external LLM over a
//! strict JSON contract and degrades silently on any failure — a down or
//! misconfigured AI provider must never fail the request, only skip the
//! upgrade (§4.4).

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use shared_types::{AIConfig, Account, Merchant, Source, Transaction, TransactionType};
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const SAVE_THRESHOLD: f32 = 0.95;

#[derive(Debug, Deserialize)]
struct AITransactionFields {
    amount: String,
    #[serde(rename = "type")]
    txn_type: String,
    date: String,
    #[serde(default)]
    mask: Option<String>,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    ref_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AIResponseBody {
    transaction: AITransactionFields,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    suggested_regex: Option<String>,
    #[serde(default)]
    field_mapping: Option<HashMap<String, usize>>,
}

/// Result of a successful AI call: a candidate transaction, and — when the
/// model was confident and precise enough — a pattern worth persisting.
pub struct AiExtraction {
    pub transaction: Transaction,
    pub confidence: f32,
    pub learned_pattern: Option<LearnedPattern>,
}

pub struct LearnedPattern {
    pub regex: String,
    pub field_mapping: HashMap<String, usize>,
    pub confidence: f32,
}

/// Strips ```json fences a chat-tuned model tends to wrap its replies in.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        trimmed
    }
}

fn prompt_for(content: &str, source: Source, date_hint: DateTime<Utc>) -> String {
    format!(
        "You are a financial transaction extraction engine. Given a {source} message, \
         reply with JSON only (no prose, no markdown fences) of the shape:\n\
         {{\"transaction\": {{\"amount\": \"<decimal string>\", \"type\": \"DEBIT|CREDIT\", \
         \"date\": \"<ISO 8601>\", \"mask\": \"<last 4 digits or null>\", \
         \"recipient\": \"<counterparty or null>\", \"ref_id\": \"<reference id or null>\"}}, \
         \"confidence\": <0..1>, \"suggested_regex\": \"<regex that matches this exact message>\", \
         \"field_mapping\": {{\"amount\": <group>, \"date\": <group>, ...}}}}\n\
         Reference date if the message omits one: {date_hint}\n\
         Message:\n{content}"
    )
}

async fn call_provider(client: &reqwest::Client, config: &AIConfig, prompt: &str) -> anyhow::Result<String> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("AI config has no api_key"))?;

    // Every provider in this codebase speaks an OpenAI-shaped chat completion
    // endpoint; only the base URL and model name vary.
    let url = match config.provider.as_str() {
        "gemini" => format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={api_key}",
            config.model_name
        ),
        _ => format!("https://api.openai.com/v1/chat/completions"),
    };

    let body = if config.provider == "gemini" {
        serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}]
        })
    } else {
        serde_json::json!({
            "model": config.model_name,
            "messages": [{"role": "user", "content": prompt}],
        })
    };

    let mut request = client.post(&url).json(&body);
    if config.provider != "gemini" {
        request = request.bearer_auth(api_key);
    }

    let response = request.send().await?.error_for_status()?;
    let value: serde_json::Value = response.json().await?;

    let text = if config.provider == "gemini" {
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("unexpected gemini response shape"))?
            .to_string()
    } else {
        value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("unexpected chat completion response shape"))?
            .to_string()
    };

    Ok(text)
}

fn parse_response(raw: &str, now: DateTime<Utc>) -> anyhow::Result<AIResponseBody> {
    let cleaned = strip_code_fences(raw);
    let parsed: AIResponseBody = serde_json::from_str(cleaned)?;
    let _ = now;
    Ok(parsed)
}

fn to_transaction(fields: &AITransactionFields, raw_message: &str, confidence: f32, now: DateTime<Utc>) -> Option<Transaction> {
    let amount = extractors::amount_parse::clean_amount(&fields.amount)?;
    if amount.is_sign_negative() || amount.is_zero() {
        return None;
    }
    let txn_type = if fields.txn_type.eq_ignore_ascii_case("credit") {
        TransactionType::Credit
    } else {
        TransactionType::Debit
    };
    let date = extractors::date_parse::try_parse_date(&fields.date).unwrap_or(now);
    let recipient = fields.recipient.clone().unwrap_or_default();

    Some(Transaction {
        amount,
        txn_type,
        date,
        currency: "INR".to_string(),
        account: Account {
            mask: fields.mask.clone(),
            provider: None,
        },
        merchant: Merchant {
            raw: recipient.clone(),
            cleaned: recipient.clone(),
        },
        description: raw_message.to_string(),
        recipient,
        ref_id: fields.ref_id.clone().unwrap_or_default(),
        balance: None,
        credit_limit: None,
        category: None,
        raw_message: raw_message.to_string(),
        confidence,
    })
}

/// Runs the full C4 contract: call the provider, validate the reply, and
/// build both the candidate transaction and (when confident/precise enough)
/// a pattern fit to persist. Any failure returns `Ok(None)` — per §4.4 this
/// must degrade silently rather than fail the whole request.
pub async fn extract(
    config: &AIConfig,
    source: Source,
    content: &str,
    date_hint: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<AiExtraction> {
    if !config.is_enabled || config.api_key.is_none() {
        return None;
    }

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().ok()?;
    let prompt = prompt_for(content, source, date_hint.unwrap_or(now));

    let raw = match call_provider(&client, config, &prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("AI fallback call failed: {e}");
            return None;
        }
    };

    let parsed = match parse_response(&raw, now) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("AI fallback returned unparseable JSON: {e}");
            return None;
        }
    };

    let confidence = parsed.confidence.unwrap_or(0.9).clamp(0.0, 1.0);
    let transaction = to_transaction(&parsed.transaction, content, confidence, now)?;

    let learned_pattern = if confidence >= SAVE_THRESHOLD {
        match (parsed.suggested_regex, parsed.field_mapping) {
            (Some(regex_src), Some(field_mapping)) => match Regex::new(&regex_src) {
                Ok(compiled) => {
                    match extractors::pattern_engine::validate_field_mapping(&compiled, &field_mapping) {
                        Ok(()) => Some(LearnedPattern {
                            regex: regex_src,
                            field_mapping,
                            confidence,
                        }),
                        Err(e) => {
                            tracing::warn!("AI-suggested field_mapping rejected: {e}");
                            None
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("AI-suggested regex failed to compile: {e}");
                    None
                }
            },
            _ => None,
        }
    } else {
        None
    };

    Some(AiExtraction {
        transaction,
        confidence,
        learned_pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_code_fence() {
        let raw = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn leaves_plain_json_untouched() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parses_well_formed_response() {
        let raw = r#"{"transaction":{"amount":"250.00","type":"DEBIT","date":"2026-01-09T00:00:00Z","mask":"9911","recipient":"CHAYA TEA STALL","ref_id":"FOO/99/21"},"confidence":0.95,"suggested_regex":"You paid Rs (\\d+) to (\\w+)","field_mapping":{"amount":1,"recipient":2}}"#;
        let parsed = parse_response(raw, Utc::now()).unwrap();
        assert_eq!(parsed.transaction.amount, "250.00");
        assert_eq!(parsed.confidence, Some(0.95));
    }
}
