use rusqlite::Connection;

/// Creates every table this service owns if they don't already exist. Plain
/// forward-only `CREATE TABLE IF NOT EXISTS` — there is exactly one schema
/// version, so no migration ladder is needed yet.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS request_logs (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            input_hash TEXT NOT NULL,
            input_payload TEXT NOT NULL,
            output_payload TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_request_logs_hash_created
            ON request_logs(input_hash, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_request_logs_status_created
            ON request_logs(status, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS pattern_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            regex TEXT NOT NULL,
            field_mapping TEXT NOT NULL,
            confidence REAL NOT NULL DEFAULT 0.7,
            is_ai_generated BOOLEAN NOT NULL DEFAULT FALSE,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TEXT NOT NULL,
            UNIQUE(source, regex)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pattern_rules_source_active
            ON pattern_rules(source, is_active)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS file_parsing_configs (
            fingerprint TEXT PRIMARY KEY,
            format TEXT NOT NULL,
            header_row_index INTEGER NOT NULL DEFAULT 0,
            columns TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS merchant_aliases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pattern TEXT NOT NULL,
            alias TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ai_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            provider TEXT NOT NULL,
            model_name TEXT NOT NULL,
            api_key TEXT,
            is_enabled BOOLEAN NOT NULL DEFAULT FALSE
        )",
        [],
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO ai_config (id, provider, model_name, api_key, is_enabled)
            VALUES (1, 'gemini', 'gemini-1.5-flash', NULL, FALSE)",
        [],
    )?;

    Ok(())
}
