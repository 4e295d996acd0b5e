use crate::database::AsyncDbConnection;
use rusqlite::params;
use shared_types::{AIConfig, UpdateAIConfigRequest};

/// Single-row config store — row `id = 1` is seeded by the migration and
/// always present.
pub async fn get(conn: AsyncDbConnection) -> anyhow::Result<AIConfig> {
    let c = conn.lock().await;
    let config = c.query_row(
        "SELECT provider, model_name, api_key, is_enabled FROM ai_config WHERE id = 1",
        [],
        |row| {
            Ok(AIConfig {
                provider: row.get(0)?,
                model_name: row.get(1)?,
                api_key: row.get(2)?,
                is_enabled: row.get(3)?,
            })
        },
    )?;
    Ok(config)
}

pub async fn update(conn: AsyncDbConnection, request: UpdateAIConfigRequest) -> anyhow::Result<AIConfig> {
    let existing = get(conn.clone()).await?;
    let updated = AIConfig {
        provider: request.provider.unwrap_or(existing.provider),
        model_name: request.model_name.unwrap_or(existing.model_name),
        api_key: request.api_key.or(existing.api_key),
        is_enabled: request.is_enabled.unwrap_or(existing.is_enabled),
    };

    let c = conn.lock().await;
    c.execute(
        "UPDATE ai_config SET provider = ?1, model_name = ?2, api_key = ?3, is_enabled = ?4 WHERE id = 1",
        params![updated.provider, updated.model_name, updated.api_key, updated.is_enabled],
    )?;

    Ok(updated)
}
