//! SQLite implementation of the configuration store and usage ledger.
//!
//! Table shapes mirror the hosted deployment: `ai_configuration` holds typed
//! settings blobs (the budget config lives under type `budget_config`),
//! `ai_usage_logs` is the append-only ledger, `ai_model_stats` carries
//! externally measured per-model metrics read at startup.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::router::adaptive::PerformanceMetrics;
use crate::router::budget::BudgetConfig;
use crate::router::usage::UsageRecord;

use super::{ConfigStore, UsageLedger};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ai_configuration (
    type        TEXT PRIMARY KEY,
    settings    TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ai_usage_logs (
    id             TEXT PRIMARY KEY,
    model_id       TEXT NOT NULL,
    tokens_input   INTEGER NOT NULL,
    tokens_output  INTEGER NOT NULL,
    cost           REAL NOT NULL,
    timestamp      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ai_model_stats (
    model_id    TEXT PRIMARY KEY,
    metrics     TEXT NOT NULL,
    updated_at  TEXT
);
";

/// SQLite-backed store. All calls hop to the blocking pool; the connection
/// is serialized behind a mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database and apply the schema.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let path = path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> anyhow::Result<Connection> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let conn = Connection::open(&path)?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await??;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| anyhow::anyhow!("sqlite connection lock poisoned"))?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl ConfigStore for SqliteStore {
    async fn load_budget_config(&self) -> anyhow::Result<Option<BudgetConfig>> {
        self.with_conn(|conn| {
            let settings: Option<String> = conn
                .query_row(
                    "SELECT settings FROM ai_configuration WHERE type = 'budget_config'",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            match settings {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn save_budget_config(&self, config: &BudgetConfig) -> anyhow::Result<()> {
        let settings = serde_json::to_string(config)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO ai_configuration (type, settings, updated_at)
                 VALUES ('budget_config', ?1, ?2)
                 ON CONFLICT(type) DO UPDATE SET
                     settings = excluded.settings,
                     updated_at = excluded.updated_at",
                params![settings, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }

    async fn load_model_stats(&self) -> anyhow::Result<Vec<(String, PerformanceMetrics)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT model_id, metrics FROM ai_model_stats")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            let mut stats = Vec::new();
            for row in rows {
                let (model_id, json) = row?;
                match serde_json::from_str(&json) {
                    Ok(metrics) => stats.push((model_id, metrics)),
                    Err(e) => {
                        tracing::warn!("Skipping malformed stats row for {}: {}", model_id, e)
                    }
                }
            }
            Ok(stats)
        })
        .await
    }
}

#[async_trait]
impl UsageLedger for SqliteStore {
    async fn append_usage(&self, record: &UsageRecord) -> anyhow::Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO ai_usage_logs
                     (id, model_id, tokens_input, tokens_output, cost, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id.to_string(),
                    record.model_id,
                    record.tokens_input as i64,
                    record.tokens_output as i64,
                    record.cost,
                    record.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }
}
