use crate::database::AsyncDbConnection;
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::{params, Row};
use shared_types::{CreatePatternRuleRequest, ListPatternsQuery, PatternRule, Source, UpdatePatternRuleRequest};
use std::collections::HashMap;

fn source_to_str(source: Source) -> &'static str {
    match source {
        Source::Sms => "SMS",
        Source::Email => "EMAIL",
        Source::File => "FILE",
        Source::Cas => "CAS",
    }
}

fn source_from_str(s: &str) -> Source {
    match s {
        "SMS" => Source::Sms,
        "EMAIL" => Source::Email,
        "FILE" => Source::File,
        _ => Source::Cas,
    }
}

fn map_row(row: &Row) -> rusqlite::Result<PatternRule> {
    let source: String = row.get(1)?;
    let mapping_json: String = row.get(3)?;
    let created_at: String = row.get(7)?;
    let field_mapping: HashMap<String, usize> = serde_json::from_str(&mapping_json).unwrap_or_default();
    Ok(PatternRule {
        id: row.get(0)?,
        source: source_from_str(&source),
        regex: row.get(2)?,
        field_mapping,
        confidence: row.get(4)?,
        is_ai_generated: row.get(5)?,
        is_active: row.get(6)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Active patterns for one source, used by the orchestrator at request time
/// (§4.3: "loads active PatternRules filtered by source at each invocation").
pub async fn list_active_for_source(conn: AsyncDbConnection, source: Source) -> anyhow::Result<Vec<PatternRule>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare(
        "SELECT id, source, regex, field_mapping, confidence, is_ai_generated, is_active, created_at
            FROM pattern_rules WHERE source = ?1 AND is_active = TRUE ORDER BY confidence DESC",
    )?;
    let rows = stmt
        .query_map(params![source_to_str(source)], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Distinct `source` values among active pattern rules, for merging into the
/// `/v1/patterns/banks` listing alongside the static bank set (examples'
/// original `GET /banks/list` — a `DISTINCT` query over active
/// `PatternRule.source`).
pub async fn distinct_active_sources(conn: AsyncDbConnection) -> anyhow::Result<Vec<Source>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare("SELECT DISTINCT source FROM pattern_rules WHERE is_active = TRUE ORDER BY source")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.iter().map(|s| source_from_str(s)).collect())
}

pub async fn list(conn: AsyncDbConnection, query: &ListPatternsQuery) -> anyhow::Result<Vec<PatternRule>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare(
        "SELECT id, source, regex, field_mapping, confidence, is_ai_generated, is_active, created_at
            FROM pattern_rules ORDER BY created_at DESC",
    )?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .filter(|p| query.source.map(|s| s == p.source).unwrap_or(true))
        .filter(|p| query.is_ai_generated.map(|v| v == p.is_ai_generated).unwrap_or(true))
        .filter(|p| {
            query
                .search
                .as_ref()
                .map(|needle| p.regex.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(true)
        })
        .collect())
}

pub async fn get(conn: AsyncDbConnection, id: i64) -> anyhow::Result<Option<PatternRule>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare(
        "SELECT id, source, regex, field_mapping, confidence, is_ai_generated, is_active, created_at
            FROM pattern_rules WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(map_row(row)?))
    } else {
        Ok(None)
    }
}

fn validate(regex_src: &str, field_mapping: &HashMap<String, usize>) -> anyhow::Result<()> {
    let compiled = Regex::new(regex_src).map_err(|e| anyhow::anyhow!("invalid regex: {e}"))?;
    extractors::pattern_engine::validate_field_mapping(&compiled, field_mapping)
        .map_err(|e| anyhow::anyhow!(e))
}

/// Inserts an operator- or AI-authored pattern (§4.3/§4.4). `is_ai_generated`
/// rules are capped at 0.95 confidence; operator rules default to 0.70 unless
/// an explicit confidence was supplied.
pub async fn insert(
    conn: AsyncDbConnection,
    request: CreatePatternRuleRequest,
    is_ai_generated: bool,
) -> anyhow::Result<PatternRule> {
    validate(&request.regex, &request.field_mapping)?;

    let confidence = request
        .confidence
        .unwrap_or(if is_ai_generated { 0.95 } else { 0.70 })
        .clamp(0.0, if is_ai_generated { 0.95 } else { 0.70 });

    let now = Utc::now();
    let mapping_json = serde_json::to_string(&request.field_mapping)?;
    let c = conn.lock().await;
    let id: i64 = c.query_row(
        "INSERT INTO pattern_rules (source, regex, field_mapping, confidence, is_ai_generated, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, TRUE, ?6) RETURNING id",
        params![
            source_to_str(request.source),
            request.regex,
            mapping_json,
            confidence,
            is_ai_generated,
            now.to_rfc3339(),
        ],
        |row| row.get(0),
    )?;

    Ok(PatternRule {
        id,
        source: request.source,
        regex: request.regex,
        field_mapping: request.field_mapping,
        confidence,
        is_ai_generated,
        is_active: true,
        created_at: now,
    })
}

pub async fn pattern_exists(conn: AsyncDbConnection, source: Source, regex: &str) -> anyhow::Result<bool> {
    let c = conn.lock().await;
    let count: i64 = c.query_row(
        "SELECT COUNT(*) FROM pattern_rules WHERE source = ?1 AND regex = ?2",
        params![source_to_str(source), regex],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub async fn update(conn: AsyncDbConnection, id: i64, request: UpdatePatternRuleRequest) -> anyhow::Result<Option<PatternRule>> {
    let existing = match get(conn.clone(), id).await? {
        Some(p) => p,
        None => return Ok(None),
    };

    let regex = request.regex.unwrap_or(existing.regex);
    let field_mapping = request.field_mapping.unwrap_or(existing.field_mapping);
    validate(&regex, &field_mapping)?;

    let max_confidence = if existing.is_ai_generated { 0.95 } else { 0.70 };
    let confidence = request
        .confidence
        .unwrap_or(existing.confidence)
        .clamp(0.0, max_confidence);
    let is_active = request.is_active.unwrap_or(existing.is_active);

    let mapping_json = serde_json::to_string(&field_mapping)?;
    let c = conn.lock().await;
    c.execute(
        "UPDATE pattern_rules SET regex = ?1, field_mapping = ?2, confidence = ?3, is_active = ?4 WHERE id = ?5",
        params![regex, mapping_json, confidence, is_active, id],
    )?;

    Ok(Some(PatternRule {
        id,
        source: existing.source,
        regex,
        field_mapping,
        confidence,
        is_ai_generated: existing.is_ai_generated,
        is_active,
        created_at: existing.created_at,
    }))
}

/// Soft-delete only — PatternRule is never hard-deleted (§3 Lifecycles).
pub async fn set_active(conn: AsyncDbConnection, id: i64, is_active: bool) -> anyhow::Result<bool> {
    let c = conn.lock().await;
    let updated = c.execute(
        "UPDATE pattern_rules SET is_active = ?1 WHERE id = ?2",
        params![is_active, id],
    )?;
    Ok(updated > 0)
}
