//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Idempotent schema, applied on every connect
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS diagnoses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT NOT NULL,
        strategy TEXT NOT NULL,
        fault_type TEXT NOT NULL,
        severity TEXT,
        confidence REAL NOT NULL,
        recommendation TEXT NOT NULL,
        readings_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_diagnoses_created_at
        ON diagnoses (created_at)",
];

/// Stored diagnosis row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiagnosisRecord {
    pub id: i64,
    pub device_id: String,
    /// Which diagnoser produced the row: "rules" or "model"
    pub strategy: String,
    pub fault_type: String,
    /// Rule-path severity label; NULL for model rows
    pub severity: Option<String>,
    /// Confidence percent (0-100), uniform across both strategies
    pub confidence: f64,
    pub recommendation: String,
    /// Input snapshot as JSON, informational only
    pub readings_json: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new diagnosis row; id and created_at are assigned on insert
#[derive(Debug, Clone)]
pub struct NewDiagnosis {
    pub device_id: String,
    pub strategy: String,
    pub fault_type: String,
    pub severity: Option<String>,
    pub confidence: f64,
    pub recommendation: String,
    pub readings_json: String,
}

/// Aggregates over the diagnoses table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisStats {
    pub total_diagnoses: i64,
    /// Row count per fault label
    pub fault_breakdown: HashMap<String, i64>,
    /// Mean confidence percent; 0.0 when the table is empty
    pub avg_confidence: f64,
}

/// SQLite-backed repository for diagnosis rows
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Open (creating if missing) the database at `url` in WAL mode and
    /// apply the schema.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repository = Self { pool };
        repository.migrate().await?;
        info!("Connected to database at {}", url);
        Ok(repository)
    }

    /// In-memory database for tests. Pooled at a single connection since
    /// each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let repository = Self { pool };
        repository.migrate().await?;
        Ok(repository)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a diagnosis and return its row id
    pub async fn insert_diagnosis(&self, diagnosis: &NewDiagnosis) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO diagnoses
                (device_id, strategy, fault_type, severity, confidence,
                 recommendation, readings_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&diagnosis.device_id)
        .bind(&diagnosis.strategy)
        .bind(&diagnosis.fault_type)
        .bind(&diagnosis.severity)
        .bind(diagnosis.confidence)
        .bind(&diagnosis.recommendation)
        .bind(&diagnosis.readings_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted diagnosis {} for {}", id, diagnosis.device_id);
        Ok(id)
    }

    /// Most recent diagnoses, newest first
    pub async fn recent(&self, limit: u32) -> Result<Vec<DiagnosisRecord>, StorageError> {
        let rows = sqlx::query_as::<_, DiagnosisRecord>(
            "SELECT id, device_id, strategy, fault_type, severity, confidence,
                    recommendation, readings_json, created_at
             FROM diagnoses ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Totals, per-fault breakdown, and mean confidence
    pub async fn stats(&self) -> Result<DiagnosisStats, StorageError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diagnoses")
            .fetch_one(&self.pool)
            .await?;

        let breakdown: Vec<(String, i64)> = sqlx::query_as(
            "SELECT fault_type, COUNT(*) FROM diagnoses GROUP BY fault_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let avg: Option<f64> = sqlx::query_scalar("SELECT AVG(confidence) FROM diagnoses")
            .fetch_one(&self.pool)
            .await?;

        Ok(DiagnosisStats {
            total_diagnoses: total,
            fault_breakdown: breakdown.into_iter().collect(),
            avg_confidence: avg.unwrap_or(0.0),
        })
    }

    /// Cheap connectivity probe
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
