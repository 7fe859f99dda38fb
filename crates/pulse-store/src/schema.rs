//! Schema bootstrap
//!
//! Tables are generated from the metric-type registry at startup. Every
//! parent table shares the same identity, time, and provenance columns;
//! scalar and session tables add their own value columns, and series and
//! session types get a child table keyed by the parent natural key with
//! cascade delete.

use pulse_common::registry::{MetricKind, MetricType};
use sqlx::SqlitePool;
use tracing::debug;

/// Columns shared by every parent table
const PARENT_COLUMNS: &str = "\
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    natural_key TEXT NOT NULL UNIQUE,
    start_time TEXT NOT NULL,
    end_time TEXT,
    zone_offset TEXT,
    origin_id TEXT NOT NULL,
    last_modified_at TEXT NOT NULL,
    client_record_id TEXT,
    client_record_version INTEGER NOT NULL DEFAULT 0,
    device_manufacturer TEXT,
    device_model TEXT,
    device_kind TEXT,
    fetched_at TEXT NOT NULL";

/// Create every table the registry calls for. Idempotent.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for metric_type in MetricType::ALL {
        for ddl in ddl_for(*metric_type) {
            debug!(table = metric_type.table(), "applying schema statement");
            sqlx::query(&ddl).execute(pool).await?;
        }
    }
    Ok(())
}

/// DDL statements for one registry entry
fn ddl_for(metric_type: MetricType) -> Vec<String> {
    let table = metric_type.table();

    match metric_type.kind() {
        MetricKind::Scalar => vec![format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {PARENT_COLUMNS},
                value REAL NOT NULL,
                value_secondary REAL,
                detail TEXT
            )"
        )],
        MetricKind::Series => {
            let child = format!("{table}_samples");
            vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        {PARENT_COLUMNS}
                    )"
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {child} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        parent_key TEXT NOT NULL
                            REFERENCES {table}(natural_key) ON DELETE CASCADE,
                        seq INTEGER NOT NULL,
                        sampled_at TEXT NOT NULL,
                        value REAL NOT NULL
                    )"
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{child}_parent
                        ON {child}(parent_key)"
                ),
            ]
        },
        MetricKind::Session => {
            let child = format!("{table}_intervals");
            vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        {PARENT_COLUMNS},
                        title TEXT,
                        notes TEXT,
                        activity TEXT
                    )"
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {child} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        parent_key TEXT NOT NULL
                            REFERENCES {table}(natural_key) ON DELETE CASCADE,
                        seq INTEGER NOT NULL,
                        start_time TEXT NOT NULL,
                        end_time TEXT NOT NULL,
                        kind TEXT NOT NULL,
                        amount INTEGER,
                        CHECK (end_time > start_time)
                    )"
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{child}_parent
                        ON {child}(parent_key)"
                ),
            ]
        },
    }
}
