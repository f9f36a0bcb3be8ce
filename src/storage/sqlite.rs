//! SQLite store.
//!
//! Local-first persistence using SQLite with WAL mode. Timestamps are stored
//! as fixed-width RFC 3339 UTC text so that text ordering is time ordering.
//!
//! # Example
//!
//! ```ignore
//! use vigilar::storage::{JobStore, SqliteStore};
//!
//! let store = SqliteStore::open("./data/vigilar.db")?;
//! let last = store.latest_job("AAPL", None)?;
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::{StorageError, StorageResult};
use super::records::{AlertRecord, ApprovalPolicy, JobStatus, RetrainJobRecord};
use super::traits::{AlertStore, ApprovalStore, JobStore};

/// Current schema version
pub const CURRENT_VERSION: &str = "1.0.0";

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS model_health_alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticker TEXT NOT NULL,
    feature TEXT NOT NULL,
    p_value REAL NOT NULL,
    statistic REAL NOT NULL,
    psi REAL NOT NULL,
    drift_score REAL NOT NULL,
    severity TEXT NOT NULL,
    alpha REAL NOT NULL,
    baseline_n INTEGER NOT NULL,
    current_n INTEGER NOT NULL,
    detected_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alerts_ticker ON model_health_alerts(ticker, detected_at);

CREATE TABLE IF NOT EXISTS retraining_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticker TEXT NOT NULL,
    triggered_at TEXT NOT NULL,
    triggered_by TEXT NOT NULL,
    drift_severity TEXT NOT NULL,
    drift_features TEXT NOT NULL DEFAULT '[]',
    job_id TEXT,
    ml_api_status TEXT NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT
);
CREATE INDEX IF NOT EXISTS idx_jobs_ticker_status ON retraining_jobs(ticker, status, triggered_at);

CREATE TABLE IF NOT EXISTS ticker_config (
    ticker TEXT PRIMARY KEY,
    requires_approval INTEGER NOT NULL DEFAULT 0
);
";

const JOB_COLUMNS: &str = "ticker, triggered_at, triggered_by, drift_severity, drift_features, \
                           job_id, ml_api_status, status, error_message";

const ALERT_COLUMNS: &str = "ticker, feature, p_value, statistic, psi, drift_score, severity, \
                             alpha, baseline_n, current_n, detected_at";

/// Initialize the database schema, creating tables if they don't exist.
pub fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA temp_store = MEMORY;",
    )?;

    conn.execute_batch(SCHEMA_SQL)?;

    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))?;
    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [CURRENT_VERSION])?;
    }

    Ok(())
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{raw}': {e}")))
}

fn parse_field<T: std::str::FromStr<Err = String>>(raw: &str) -> StorageResult<T> {
    raw.parse().map_err(StorageError::Serialization)
}

/// Raw alert row before text fields are decoded
type AlertRow = (String, String, f64, f64, f64, f64, String, f64, i64, i64, String);

/// Raw job row before text fields are decoded
type JobRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
);

fn read_alert_row(row: &Row<'_>) -> rusqlite::Result<AlertRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn decode_alert(raw: AlertRow) -> StorageResult<AlertRecord> {
    let (entity_id, feature, p_value, statistic, psi, drift_score, severity, alpha, bn, cn, at) =
        raw;
    Ok(AlertRecord {
        entity_id,
        feature,
        p_value,
        statistic,
        psi,
        drift_score,
        severity: parse_field(&severity)?,
        alpha,
        baseline_n: bn as usize,
        current_n: cn as usize,
        detected_at: parse_ts(&at)?,
    })
}

fn read_job_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn decode_job(raw: JobRow) -> StorageResult<RetrainJobRecord> {
    let (entity_id, at, by, severity, features, job_id, call, status, error_message) = raw;
    Ok(RetrainJobRecord {
        entity_id,
        triggered_at: parse_ts(&at)?,
        triggered_by: by,
        drift_severity: parse_field(&severity)?,
        drift_features: serde_json::from_str(&features)?,
        external_job_id: job_id,
        call_status: parse_field(&call)?,
        outcome_status: parse_field(&status)?,
        error_message,
    })
}

/// SQLite-backed alert, job and approval store
#[derive(Debug)]
pub struct SqliteStore {
    path: String,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file (use ":memory:" for in-memory)
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path.as_ref())
            .map_err(|e| StorageError::Backend(format!("Failed to open {path_str}: {e}")))?;
        init_schema(&conn)
            .map_err(|e| StorageError::Backend(format!("Failed to initialize schema: {e}")))?;

        Ok(Self { path: path_str, conn: Mutex::new(conn) })
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open(":memory:")
    }

    /// Get the database path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AlertStore for SqliteStore {
    fn insert_alerts(&self, alerts: &[AlertRecord]) -> StorageResult<()> {
        let mut conn = self.lock_conn();
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Backend(format!("Failed to begin transaction: {e}")))?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO model_health_alerts ({ALERT_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ))
                .map_err(|e| StorageError::Backend(format!("Failed to prepare insert: {e}")))?;
            for a in alerts {
                stmt.execute(params![
                    a.entity_id,
                    a.feature,
                    a.p_value,
                    a.statistic,
                    a.psi,
                    a.drift_score,
                    a.severity.as_str(),
                    a.alpha,
                    a.baseline_n as i64,
                    a.current_n as i64,
                    format_ts(&a.detected_at),
                ])
                .map_err(|e| StorageError::Query(format!("Failed to insert alert: {e}")))?;
            }
        }
        tx.commit().map_err(|e| StorageError::Backend(format!("Failed to commit alerts: {e}")))
    }

    fn alerts(&self, entity_id: Option<&str>) -> StorageResult<Vec<AlertRecord>> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ALERT_COLUMNS} FROM model_health_alerts \
                 WHERE (?1 IS NULL OR ticker = ?1) ORDER BY detected_at, id"
            ))
            .map_err(|e| StorageError::Backend(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![entity_id], read_alert_row)
            .map_err(|e| StorageError::Query(format!("Failed to query alerts: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let raw =
                row.map_err(|e| StorageError::Query(format!("Failed to read alert row: {e}")))?;
            out.push(decode_alert(raw)?);
        }
        Ok(out)
    }
}

impl JobStore for SqliteStore {
    fn insert_job(&self, job: &RetrainJobRecord) -> StorageResult<()> {
        let features = serde_json::to_string(&job.drift_features)?;
        self.lock_conn()
            .execute(
                &format!(
                    "INSERT INTO retraining_jobs ({JOB_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    job.entity_id,
                    format_ts(&job.triggered_at),
                    job.triggered_by,
                    job.drift_severity.as_str(),
                    features,
                    job.external_job_id,
                    job.call_status.as_str(),
                    job.outcome_status.as_str(),
                    job.error_message,
                ],
            )
            .map_err(|e| StorageError::Query(format!("Failed to insert job: {e}")))?;
        Ok(())
    }

    fn latest_job(
        &self,
        entity_id: &str,
        status: Option<JobStatus>,
    ) -> StorageResult<Option<RetrainJobRecord>> {
        let conn = self.lock_conn();
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {JOB_COLUMNS} FROM retraining_jobs \
                     WHERE ticker = ?1 AND (?2 IS NULL OR status = ?2) \
                     ORDER BY triggered_at DESC, id DESC LIMIT 1"
                ),
                params![entity_id, status.map(|s| s.as_str())],
                read_job_row,
            )
            .optional()
            .map_err(|e| StorageError::Query(format!("Failed to query latest job: {e}")))?;

        raw.map(decode_job).transpose()
    }

    fn jobs(&self, entity_id: Option<&str>) -> StorageResult<Vec<RetrainJobRecord>> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM retraining_jobs \
                 WHERE (?1 IS NULL OR ticker = ?1) ORDER BY triggered_at, id"
            ))
            .map_err(|e| StorageError::Backend(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![entity_id], read_job_row)
            .map_err(|e| StorageError::Query(format!("Failed to query jobs: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let raw =
                row.map_err(|e| StorageError::Query(format!("Failed to read job row: {e}")))?;
            out.push(decode_job(raw)?);
        }
        Ok(out)
    }
}

impl ApprovalStore for SqliteStore {
    fn approval_policy(&self, entity_id: &str) -> StorageResult<Option<ApprovalPolicy>> {
        let requires: Option<bool> = self
            .lock_conn()
            .query_row(
                "SELECT requires_approval FROM ticker_config WHERE ticker = ?1",
                [entity_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Query(format!("Failed to query approval policy: {e}")))?;

        Ok(requires.map(|requires_approval| ApprovalPolicy {
            entity_id: entity_id.to_string(),
            requires_approval,
        }))
    }

    fn set_approval(&self, entity_id: &str, requires_approval: bool) -> StorageResult<()> {
        self.lock_conn()
            .execute(
                "INSERT INTO ticker_config (ticker, requires_approval) VALUES (?1, ?2) \
                 ON CONFLICT(ticker) DO UPDATE SET requires_approval = excluded.requires_approval",
                params![entity_id, requires_approval],
            )
            .map_err(|e| StorageError::Query(format!("Failed to set approval policy: {e}")))?;
        Ok(())
    }
}
