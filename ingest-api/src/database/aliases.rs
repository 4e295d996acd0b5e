use crate::database::AsyncDbConnection;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use shared_types::{CreateAliasRequest, MerchantAlias};

fn map_row(row: &Row) -> rusqlite::Result<MerchantAlias> {
    let created_at: String = row.get(3)?;
    Ok(MerchantAlias {
        id: row.get(0)?,
        pattern: row.get(1)?,
        alias: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub async fn list(conn: AsyncDbConnection) -> anyhow::Result<Vec<MerchantAlias>> {
    let c = conn.lock().await;
    let mut stmt = c.prepare("SELECT id, pattern, alias, created_at FROM merchant_aliases ORDER BY id")?;
    let rows = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub async fn insert(conn: AsyncDbConnection, request: CreateAliasRequest) -> anyhow::Result<MerchantAlias> {
    let now = Utc::now();
    let c = conn.lock().await;
    let id: i64 = c.query_row(
        "INSERT INTO merchant_aliases (pattern, alias, created_at) VALUES (?1, ?2, ?3) RETURNING id",
        params![request.pattern, request.alias, now.to_rfc3339()],
        |row| row.get(0),
    )?;
    Ok(MerchantAlias {
        id,
        pattern: request.pattern,
        alias: request.alias,
        created_at: now,
    })
}

pub async fn delete(conn: AsyncDbConnection, id: i64) -> anyhow::Result<bool> {
    let c = conn.lock().await;
    let deleted = c.execute("DELETE FROM merchant_aliases WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
