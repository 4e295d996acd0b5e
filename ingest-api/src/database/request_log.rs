use crate::database::AsyncDbConnection;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};
use shared_types::{ListLogsQuery, LogListResponse, RequestLog, StatsResponse};
use std::collections::HashMap;

fn map_row(row: &Row) -> rusqlite::Result<RequestLog> {
    let created_at: String = row.get(6)?;
    Ok(RequestLog {
        id: row.get(0)?,
        source: row.get(1)?,
        input_hash: row.get(2)?,
        input_payload: row.get(3)?,
        output_payload: row.get(4)?,
        status: row.get(5)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub async fn insert(conn: AsyncDbConnection, log: &RequestLog) -> anyhow::Result<()> {
    let c = conn.lock().await;
    c.execute(
        "INSERT INTO request_logs (id, source, input_hash, input_payload, output_payload, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            log.id,
            log.source,
            log.input_hash,
            log.input_payload,
            log.output_payload,
            log.status,
            log.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Layer 1 idempotency check (§4.9): a RequestLog with the same `input_hash`
/// created within the last 5 minutes short-circuits the request.
pub async fn find_recent_by_hash(
    conn: AsyncDbConnection,
    input_hash: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<RequestLog>> {
    let c = conn.lock().await;
    let cutoff = (now - Duration::minutes(5)).to_rfc3339();
    let mut stmt = c.prepare(
        "SELECT id, source, input_hash, input_payload, output_payload, status, created_at
            FROM request_logs WHERE input_hash = ?1 AND created_at >= ?2
            ORDER BY created_at DESC LIMIT 1",
    )?;
    let mut rows = stmt.query(params![input_hash, cutoff])?;
    if let Some(row) = rows.next()? {
        Ok(Some(map_row(row)?))
    } else {
        Ok(None)
    }
}

/// Layer 2 cross-source scan (§4.9): every *successful* RequestLog from the
/// last 15 minutes carrying a different `input_hash` than the one just
/// processed. The caller re-parses `output_payload` into Transactions to run
/// the fuzzy/ref-id comparison.
pub async fn recent_successful_excluding_hash(
    conn: AsyncDbConnection,
    input_hash: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<RequestLog>> {
    let c = conn.lock().await;
    let cutoff = (now - Duration::minutes(15)).to_rfc3339();
    let mut stmt = c.prepare(
        "SELECT id, source, input_hash, input_payload, output_payload, status, created_at
            FROM request_logs
            WHERE status = 'success' AND input_hash != ?1 AND created_at >= ?2
            ORDER BY created_at DESC",
    )?;
    let rows = stmt
        .query_map(params![input_hash, cutoff], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub async fn get(conn: AsyncDbConnection, id: &str) -> anyhow::Result<Option<RequestLog>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare(
        "SELECT id, source, input_hash, input_payload, output_payload, status, created_at
            FROM request_logs WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(map_row(row)?))
    } else {
        Ok(None)
    }
}

pub async fn list(conn: AsyncDbConnection, query: &ListLogsQuery) -> anyhow::Result<LogListResponse> {
    let c = conn.lock().await;

    let mut where_clauses = Vec::new();
    let mut bind_source = None;
    let mut bind_status = None;
    if let Some(source) = &query.source {
        where_clauses.push("source = ?");
        bind_source = Some(source.clone());
    }
    if let Some(status) = &query.status {
        where_clauses.push("status = ?");
        bind_status = Some(status.clone());
    }
    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let mut count_params: Vec<&dyn rusqlite::ToSql> = Vec::new();
    if let Some(s) = &bind_source {
        count_params.push(s);
    }
    if let Some(s) = &bind_status {
        count_params.push(s);
    }

    let total: i64 = c.query_row(
        &format!("SELECT COUNT(*) FROM request_logs {where_sql}"),
        count_params.as_slice(),
        |row| row.get(0),
    )?;

    let mut list_params = count_params.clone();
    list_params.push(&query.limit);
    list_params.push(&query.offset);

    let mut stmt = c.prepare(&format!(
        "SELECT id, source, input_hash, input_payload, output_payload, status, created_at
            FROM request_logs {where_sql}
            ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))?;
    let logs = stmt
        .query_map(list_params.as_slice(), map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LogListResponse {
        total,
        limit: query.limit,
        offset: query.offset,
        logs,
    })
}

/// Last-24h counts for `/v1/stats` (§4.11): status breakdown, source
/// breakdown, and a rough "parser_performance" tally keyed by the
/// `parser_used` field embedded in each log's `output_payload`.
pub async fn stats(conn: AsyncDbConnection, now: DateTime<Utc>) -> anyhow::Result<StatsResponse> {
    let c = conn.lock().await;
    let cutoff = (now - Duration::hours(24)).to_rfc3339();

    let mut status_breakdown = HashMap::new();
    {
        let mut stmt = c.prepare(
            "SELECT status, COUNT(*) FROM request_logs WHERE created_at >= ?1 GROUP BY status",
        )?;
        let mut rows = stmt.query(params![cutoff])?;
        while let Some(row) = rows.next()? {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            status_breakdown.insert(status, count);
        }
    }

    let mut source_breakdown = HashMap::new();
    {
        let mut stmt = c.prepare(
            "SELECT source, COUNT(*) FROM request_logs WHERE created_at >= ?1 GROUP BY source",
        )?;
        let mut rows = stmt.query(params![cutoff])?;
        while let Some(row) = rows.next()? {
            let source: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            source_breakdown.insert(source, count);
        }
    }

    let mut parser_performance = HashMap::new();
    {
        let mut stmt = c.prepare(
            "SELECT output_payload FROM request_logs WHERE created_at >= ?1 AND status = 'success' AND output_payload IS NOT NULL",
        )?;
        let mut rows = stmt.query(params![cutoff])?;
        while let Some(row) = rows.next()? {
            let payload: String = row.get(0)?;
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&payload) {
                if let Some(results) = value.get("results").and_then(|r| r.as_array()) {
                    for item in results {
                        if let Some(name) = item
                            .get("metadata")
                            .and_then(|m| m.get("parser_used"))
                            .and_then(|p| p.as_str())
                        {
                            *parser_performance.entry(name.to_string()).or_insert(0) += 1;
                        }
                    }
                }
            }
        }
    }

    Ok(StatsResponse {
        status_breakdown,
        source_breakdown,
        parser_performance,
    })
}
