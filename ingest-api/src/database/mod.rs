pub mod ai_config;
pub mod aliases;
pub mod file_configs;
pub mod migrations;
pub mod patterns;
pub mod request_log;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type DbConnection = Arc<Mutex<Connection>>;

#[derive(Clone)]
pub struct AsyncDbConnection {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl AsyncDbConnection {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn lock(&self) -> PooledConnection<SqliteConnectionManager> {
        self.pool
            .get()
            .expect("Failed to get DB connection from pool")
    }
}

#[derive(Clone)]
pub struct Database {
    pub connection: DbConnection,
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Opens (creating if absent) the sqlite file at `db_path`, runs
    /// migrations on a single sync connection, then builds a pooled async
    /// handle for request handlers.
    pub fn new(db_path: &PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let sync_conn = Connection::open(db_path)?;
        let sync_mutex = Arc::new(Mutex::new(sync_conn));

        {
            let conn = sync_mutex.lock().unwrap();
            migrations::run_migrations(&conn)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        Ok(Database {
            connection: sync_mutex,
            async_connection: AsyncDbConnection::new(pool),
        })
    }

    /// Deletes every `request_logs` row older than 24 hours. Called on an
    /// hourly timer from `main` (§4.11 retention).
    pub async fn prune_request_logs(&self, older_than: chrono::DateTime<chrono::Utc>) -> anyhow::Result<usize> {
        let conn = self.async_connection.lock().await;
        let deleted = conn.execute(
            "DELETE FROM request_logs WHERE created_at < ?1",
            rusqlite::params![older_than.to_rfc3339()],
        )?;
        Ok(deleted)
    }
}
