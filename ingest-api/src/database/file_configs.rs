use crate::database::AsyncDbConnection;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use shared_types::{FileFormat, FileParsingConfig, SaveFileMappingRequest};
use std::collections::HashMap;

fn format_to_str(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Csv => "CSV",
        FileFormat::Excel => "EXCEL",
    }
}

fn format_from_str(s: &str) -> FileFormat {
    match s {
        "EXCEL" => FileFormat::Excel,
        _ => FileFormat::Csv,
    }
}

fn map_row(row: &Row) -> rusqlite::Result<FileParsingConfig> {
    let format: String = row.get(1)?;
    let columns_json: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    let columns: HashMap<String, String> = serde_json::from_str(&columns_json).unwrap_or_default();
    Ok(FileParsingConfig {
        fingerprint: row.get(0)?,
        format: format_from_str(&format),
        header_row_index: row.get::<_, i64>(2)? as usize,
        columns,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub async fn get(conn: AsyncDbConnection, fingerprint: &str) -> anyhow::Result<Option<FileParsingConfig>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare(
        "SELECT fingerprint, format, header_row_index, columns, created_at, updated_at
            FROM file_parsing_configs WHERE fingerprint = ?1",
    )?;
    let mut rows = stmt.query(params![fingerprint])?;
    if let Some(row) = rows.next()? {
        Ok(Some(map_row(row)?))
    } else {
        Ok(None)
    }
}

/// Upserts the remembered column mapping for a file fingerprint, so the next
/// upload of the same statement shape skips the `analysis_required` round
/// trip (§4.5).
pub async fn save(conn: AsyncDbConnection, request: SaveFileMappingRequest) -> anyhow::Result<FileParsingConfig> {
    let now = Utc::now();
    let format = request.format.unwrap_or(FileFormat::Csv);
    let columns_json = serde_json::to_string(&request.columns)?;

    let c = conn.lock().await;
    c.execute(
        "INSERT INTO file_parsing_configs (fingerprint, format, header_row_index, columns, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(fingerprint) DO UPDATE SET
                format = excluded.format,
                header_row_index = excluded.header_row_index,
                columns = excluded.columns,
                updated_at = excluded.updated_at",
        params![
            request.fingerprint,
            format_to_str(format),
            request.header_row_index as i64,
            columns_json,
            now.to_rfc3339(),
        ],
    )?;

    Ok(FileParsingConfig {
        fingerprint: request.fingerprint,
        format,
        header_row_index: request.header_row_index,
        columns: request.columns,
        created_at: now,
        updated_at: now,
    })
}
