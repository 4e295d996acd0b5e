//! C10 — Pipeline Orchestrator. Wires C1 (classifier) through C9 (dedup),
//! resolving confidence arbitration and writing the RequestLog audit trail
//! (§4.10). This is the only module that touches both the `extractors`
//! parsing layer and the database.

use crate::ai_fallback;
use crate::database::{ai_config, aliases, patterns, request_log, AsyncDbConnection};
use chrono::{DateTime, Utc};
use extractors::bank_parsers::{Candidate, ParserRegistry};
use extractors::pattern_engine::{evaluate_pattern, TransactionPattern};
use extractors::{classifier, dedup, normalizer, validator};
use sha2::{Digest, Sha256};
use shared_types::{
    IngestionResult, ParsedItem, ParsedItemMetadata, ParsedItemStatus, RequestLog, RequestLogStatus, Source,
    Transaction,
};
use std::collections::HashMap;
use uuid::Uuid;

const AI_CONFIDENCE_THRESHOLD: f32 = 0.9;

pub fn compute_input_hash(source: Source, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Converts a persisted `PatternRule` into the same `TransactionPattern`
/// shape the static bank parsers use, so C2 and C3 candidates are arbitrated
/// identically (§4.3).
fn rule_to_pattern(rule: &shared_types::PatternRule) -> Option<TransactionPattern> {
    let regex = regex::Regex::new(&rule.regex).ok()?;
    let field_map: HashMap<&'static str, usize> = rule
        .field_mapping
        .iter()
        .filter_map(|(k, v)| {
            let key: &'static str = match k.as_str() {
                "amount" => extractors::pattern_engine::FIELD_AMOUNT,
                "date" => extractors::pattern_engine::FIELD_DATE,
                "mask" => extractors::pattern_engine::FIELD_MASK,
                "recipient" => extractors::pattern_engine::FIELD_RECIPIENT,
                "ref_id" => extractors::pattern_engine::FIELD_REF_ID,
                "balance" => extractors::pattern_engine::FIELD_BALANCE,
                "type" => extractors::pattern_engine::FIELD_TYPE,
                "credit_limit" => extractors::pattern_engine::FIELD_CREDIT_LIMIT,
                _ => return None,
            };
            Some((key, *v))
        })
        .collect();
    Some(TransactionPattern {
        regex,
        confidence: rule.confidence,
        txn_type: shared_types::TransactionType::Debit,
        field_map,
    })
}

struct Winner {
    transaction: Transaction,
    parser_used: String,
}

/// Picks the highest-confidence candidate, ties broken by insertion order
/// (§4.10 step 5 — "ties broken by parser order").
fn best_candidate(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.transaction.confidence.partial_cmp(&b.transaction.confidence).unwrap())
        .map(|(idx, _)| idx)
}

/// Runs C1-C9 against one SMS/email message and returns the full result,
/// including the RequestLog row it wrote (caller persists nothing further).
pub async fn ingest_message(
    db: AsyncDbConnection,
    source: Source,
    sender: &str,
    content: &str,
    date_hint: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    registry: &ParserRegistry,
) -> anyhow::Result<IngestionResult> {
    let input_hash = compute_input_hash(source, content);

    if request_log::find_recent_by_hash(db.clone(), &input_hash, now)
        .await?
        .is_some()
    {
        return Ok(IngestionResult::duplicate_submission());
    }

    let log_id = Uuid::new_v4().to_string();
    let mut log = RequestLog {
        id: log_id.clone(),
        source: source.as_str().to_string(),
        input_hash: input_hash.clone(),
        input_payload: content.to_string(),
        output_payload: None,
        status: RequestLogStatus::Processing.as_str().to_string(),
        created_at: now,
    };
    request_log::insert(db.clone(), &log).await?;

    if !classifier::is_financial(content) {
        log.status = RequestLogStatus::Ignored.as_str().to_string();
        finalize(db.clone(), &mut log, None).await?;
        return Ok(IngestionResult::ignored(vec!["message did not look financial".to_string()]));
    }

    let mut candidates = registry.collect_candidates(sender, content, source, date_hint, now);

    let rule_source = match source {
        Source::Sms | Source::Email => Some(source),
        _ => None,
    };
    if let Some(rule_source) = rule_source {
        let rules = patterns::list_active_for_source(db.clone(), rule_source).await?;
        for rule in &rules {
            if let Some(pattern) = rule_to_pattern(rule) {
                if let Some(transaction) = evaluate_pattern(&pattern, content, content, date_hint, now) {
                    candidates.push(Candidate {
                        transaction,
                        parser_name: "PatternStore",
                    });
                }
            }
        }
    }

    let best_idx = best_candidate(&candidates);
    let best_regex_confidence = best_idx.map(|idx| candidates[idx].transaction.confidence);

    let mut winner = match best_idx {
        Some(idx) if best_regex_confidence.unwrap() >= AI_CONFIDENCE_THRESHOLD => Some(Winner {
            transaction: candidates[idx].transaction.clone(),
            parser_used: candidates[idx].parser_name.to_string(),
        }),
        _ => None,
    };

    if winner.is_none() {
        let ai_config = ai_config::get(db.clone()).await.ok();

        if let Some(config) = ai_config {
            if let Some(ai_result) = ai_fallback::extract(&config, source, content, date_hint, now).await {
                let ai_beats_regex = best_regex_confidence
                    .map(|confidence| ai_result.confidence > confidence)
                    .unwrap_or(true);

                if ai_beats_regex {
                    if let Some(learned) = &ai_result.learned_pattern {
                        let already_exists = patterns::pattern_exists(db.clone(), source, &learned.regex)
                            .await
                            .unwrap_or(false);
                        if !already_exists {
                            let request = shared_types::CreatePatternRuleRequest {
                                source,
                                regex: learned.regex.clone(),
                                field_mapping: learned.field_mapping.clone(),
                                confidence: Some(learned.confidence),
                            };
                            if let Err(e) = patterns::insert(db.clone(), request, true).await {
                                tracing::warn!("failed to persist AI-learned pattern: {e}");
                            }
                        }
                    }
                    winner = Some(Winner {
                        transaction: ai_result.transaction,
                        parser_used: "AIFallback".to_string(),
                    });
                }
            }
        }

        if winner.is_none() {
            if let Some(idx) = best_idx {
                winner = Some(Winner {
                    transaction: candidates[idx].transaction.clone(),
                    parser_used: candidates[idx].parser_name.to_string(),
                });
            }
        }
    }

    let Some(mut winner) = winner else {
        log.status = RequestLogStatus::Failed.as_str().to_string();
        finalize(db.clone(), &mut log, None).await?;
        return Ok(IngestionResult::failed(vec!["no extraction candidate matched".to_string()]));
    };

    let merchant_aliases = aliases::list(db.clone()).await.unwrap_or_default();
    // The parser's own `recipient` capture is already the narrow field (e.g.
    // "SIDHARTHA SWAIN"); only fall back to scanning the full raw message
    // when that capture came back empty.
    let recipient_source = if winner.transaction.recipient.trim().is_empty() {
        winner.transaction.description.clone()
    } else {
        winner.transaction.recipient.clone()
    };
    winner.transaction.recipient = normalizer::extract_recipient(&recipient_source)
        .unwrap_or_else(|| winner.transaction.recipient.clone());
    winner.transaction.merchant.cleaned =
        normalizer::normalize_merchant(&winner.transaction.recipient, &merchant_aliases);

    let warnings = validator::validate(&winner.transaction, content, now);
    validator::enrich_time(&mut winner.transaction, now);

    let mut status = ParsedItemStatus::Extracted;
    let mut parser_used = winner.parser_used.clone();

    let recent_logs = request_log::recent_successful_excluding_hash(db.clone(), &input_hash, now).await?;
    for other in &recent_logs {
        if let Some(payload) = &other.output_payload {
            if let Ok(prior) = serde_json::from_str::<IngestionResult>(payload) {
                let is_dup = prior
                    .results
                    .iter()
                    .any(|item| dedup::is_duplicate(&winner.transaction, &item.transaction));
                if is_dup {
                    status = ParsedItemStatus::CrossSourceDuplicate;
                    parser_used = "Deduplicator".to_string();
                    break;
                }
            }
        }
    }

    let item = ParsedItem {
        status,
        metadata: ParsedItemMetadata {
            parser_used,
            source_original: content.to_string(),
            confidence: winner.transaction.confidence,
        },
        transaction: winner.transaction,
    };

    let result = IngestionResult::success(vec![item], warnings);
    log.status = RequestLogStatus::Success.as_str().to_string();
    finalize(db.clone(), &mut log, Some(&result)).await?;

    Ok(result)
}

async fn finalize(db: AsyncDbConnection, log: &mut RequestLog, result: Option<&IngestionResult>) -> anyhow::Result<()> {
    if let Some(result) = result {
        log.output_payload = Some(serde_json::to_string(result)?);
    }
    let c = db.lock().await;
    c.execute(
        "UPDATE request_logs SET status = ?1, output_payload = ?2 WHERE id = ?3",
        rusqlite::params![log.status, log.output_payload, log.id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::AsyncDbConnection;
    use chrono::TimeZone;
    use extractors::bank_parsers::ParserRegistry;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;
    use shared_types::{CreatePatternRuleRequest, IngestionStatus, ParsedItemStatus, TransactionType};
    use std::collections::HashMap;

    #[test]
    fn hash_is_stable_for_same_source_and_content() {
        let a = compute_input_hash(Source::Sms, "hello world");
        let b = compute_input_hash(Source::Sms, "hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_across_sources() {
        let a = compute_input_hash(Source::Sms, "hello world");
        let b = compute_input_hash(Source::Email, "hello world");
        assert_ne!(a, b);
    }

    /// A single pooled connection backed by `:memory:`. `max_size(1)` keeps
    /// every checkout pointing at the same database instead of each one
    /// getting its own independent empty in-memory db.
    async fn memory_db() -> AsyncDbConnection {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).expect("build in-memory pool");
        let db = AsyncDbConnection::new(pool);
        {
            let conn = db.lock().await;
            crate::database::migrations::run_migrations(&conn).expect("run migrations");
        }
        db
    }

    #[tokio::test]
    async fn hdfc_sent_sms_strips_title_from_recipient() {
        let db = memory_db().await;
        let registry = ParserRegistry::new();
        let now = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();

        let result = ingest_message(
            db,
            Source::Sms,
            "HDFCBK",
            "Sent Rs.70.00 From HDFC Bank A/C *5244 To Mr SIDHARTHA SWAIN On 09/01/26 Ref 116929657356",
            None,
            now,
            &registry,
        )
        .await
        .unwrap();

        assert_eq!(result.status, IngestionStatus::Success);
        let item = &result.results[0];
        assert_eq!(item.transaction.amount, rust_decimal::Decimal::new(7000, 2));
        assert_eq!(item.transaction.txn_type, TransactionType::Debit);
        assert_eq!(item.transaction.account.mask.as_deref(), Some("5244"));
        assert_eq!(item.transaction.recipient, "SIDHARTHA SWAIN");
        assert_eq!(item.transaction.ref_id, "116929657356");
        assert!(item.transaction.confidence >= 0.9);
        assert!(item.metadata.parser_used.starts_with("HDFC"));
    }

    #[tokio::test]
    async fn icici_spent_sms_normalizes_merchant_to_amazon() {
        let db = memory_db().await;
        let registry = ParserRegistry::new();
        let now = Utc.with_ymd_and_hms(2024, 9, 23, 12, 0, 0).unwrap();

        let result = ingest_message(
            db,
            Source::Sms,
            "ICICIB",
            "INR 869.00 spent using ICICI Bank Card XX0004 on 23-Sep-24 on IND*Amazon. Avl Limit: INR 2,39,131.00",
            None,
            now,
            &registry,
        )
        .await
        .unwrap();

        assert_eq!(result.status, IngestionStatus::Success);
        let item = &result.results[0];
        assert_eq!(item.transaction.amount, rust_decimal::Decimal::new(86900, 2));
        assert_eq!(item.transaction.txn_type, TransactionType::Debit);
        assert_eq!(item.transaction.account.mask.as_deref(), Some("0004"));
        assert_eq!(item.transaction.merchant.cleaned, "Amazon");
        assert_eq!(
            item.transaction.date.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 9, 23).unwrap()
        );
        assert_eq!(item.transaction.credit_limit, Some(rust_decimal::Decimal::new(23913100, 2)));
        assert!(item.transaction.confidence >= 0.9);
    }

    #[tokio::test]
    async fn resubmitting_within_five_minutes_is_rejected_as_duplicate() {
        let db = memory_db().await;
        let registry = ParserRegistry::new();
        let now = Utc.with_ymd_and_hms(2024, 9, 23, 12, 0, 0).unwrap();
        let content =
            "INR 869.00 spent using ICICI Bank Card XX0004 on 23-Sep-24 on IND*Amazon. Avl Limit: INR 2,39,131.00";

        let first = ingest_message(db.clone(), Source::Sms, "ICICIB", content, None, now, &registry)
            .await
            .unwrap();
        assert_eq!(first.status, IngestionStatus::Success);

        let second = ingest_message(
            db,
            Source::Sms,
            "ICICIB",
            content,
            None,
            now + chrono::Duration::minutes(2),
            &registry,
        )
        .await
        .unwrap();
        assert_eq!(second.status, IngestionStatus::DuplicateSubmission);
    }

    #[tokio::test]
    async fn unknown_bank_sms_with_no_strong_match_and_ai_disabled_fails() {
        let db = memory_db().await;
        let registry = ParserRegistry::new();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();

        let result = ingest_message(
            db,
            Source::Sms,
            "FOOBANK",
            "You paid Rs 250 to CHAYA TEA STALL via Foo Bank a/c 9911 ref FOO/99/21",
            None,
            now,
            &registry,
        )
        .await
        .unwrap();

        assert_eq!(result.status, IngestionStatus::Failed);
    }

    /// Covers the second half of the unknown-bank scenario: once a rule has
    /// been learned (here seeded directly, standing in for a prior AI save)
    /// replaying the same text matches it through PatternStore without any
    /// AI call — `ai_config` is left at its default disabled row, so a
    /// result here could only have come from the seeded rule.
    #[tokio::test]
    async fn replaying_text_after_pattern_is_learned_matches_without_ai() {
        let db = memory_db().await;
        let registry = ParserRegistry::new();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let content = "You paid Rs 250 to CHAYA TEA STALL via Foo Bank a/c 9911 ref FOO/99/21";

        let mut field_mapping = HashMap::new();
        field_mapping.insert("amount".to_string(), 1);
        field_mapping.insert("recipient".to_string(), 2);
        field_mapping.insert("mask".to_string(), 3);
        field_mapping.insert("ref_id".to_string(), 4);

        patterns::insert(
            db.clone(),
            CreatePatternRuleRequest {
                source: Source::Sms,
                regex: r"(?i)You paid Rs\s*([\d,]+\.?\d*)\s*to\s*(.*?)\s*via\s*.*?a/c\s*(\d+)\s*ref\s*(\S+)"
                    .to_string(),
                field_mapping,
                confidence: Some(0.95),
            },
            true,
        )
        .await
        .unwrap();

        let result = ingest_message(
            db,
            Source::Sms,
            "FOOBANK",
            content,
            None,
            now + chrono::Duration::minutes(6),
            &registry,
        )
        .await
        .unwrap();

        assert_eq!(result.status, IngestionStatus::Success);
        let item = &result.results[0];
        assert_eq!(item.metadata.parser_used, "PatternStore");
        assert_eq!(item.status, ParsedItemStatus::Extracted);
        assert_eq!(item.transaction.amount, rust_decimal::Decimal::new(250, 0));
        assert_eq!(item.transaction.recipient, "CHAYA TEA STALL");
        assert_eq!(item.transaction.account.mask.as_deref(), Some("9911"));
        assert_eq!(item.transaction.ref_id, "FOO/99/21");
    }
}
