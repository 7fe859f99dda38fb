//! Store operations for single-table scalar types
//!
//! Scalar commits are batched: each batch becomes one multi-row
//! `INSERT ... ON CONFLICT(natural_key) DO UPDATE`, so re-committing a
//! record overwrites the existing row instead of duplicating it.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use pulse_common::registry::MetricType;

use crate::entity::{ScalarEntity, ScalarRow};

/// Rows per insert statement, bounded by the SQLite bind-parameter limit
const UPSERT_CHUNK_SIZE: usize = 50;

/// Store for one scalar metric type
#[derive(Debug, Clone)]
pub struct ScalarStore {
    pool: SqlitePool,
    metric_type: MetricType,
}

impl ScalarStore {
    pub fn new(pool: SqlitePool, metric_type: MetricType) -> Self {
        Self { pool, metric_type }
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    fn table(&self) -> &'static str {
        self.metric_type.table()
    }

    /// Insert or replace a batch of rows, keyed on natural_key
    pub async fn upsert_batch(&self, rows: &[ScalarRow]) -> Result<u64, sqlx::Error> {
        let mut affected = 0;

        for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO {} (natural_key, start_time, end_time, zone_offset, \
                 origin_id, last_modified_at, client_record_id, client_record_version, \
                 device_manufacturer, device_model, device_kind, fetched_at, \
                 value, value_secondary, detail) ",
                self.table()
            ));

            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.meta.natural_key.clone())
                    .push_bind(row.meta.start_time)
                    .push_bind(row.meta.end_time)
                    .push_bind(row.meta.zone_offset.clone())
                    .push_bind(row.meta.provenance.origin_id.clone())
                    .push_bind(row.meta.provenance.last_modified_at)
                    .push_bind(row.meta.provenance.client_record_id.clone())
                    .push_bind(row.meta.provenance.client_record_version)
                    .push_bind(row.meta.device_manufacturer())
                    .push_bind(row.meta.device_model())
                    .push_bind(row.meta.device_kind())
                    .push_bind(row.meta.fetched_at)
                    .push_bind(row.value)
                    .push_bind(row.value_secondary)
                    .push_bind(row.detail.clone());
            });

            qb.push(
                " ON CONFLICT(natural_key) DO UPDATE SET \
                 start_time = excluded.start_time, \
                 end_time = excluded.end_time, \
                 zone_offset = excluded.zone_offset, \
                 origin_id = excluded.origin_id, \
                 last_modified_at = excluded.last_modified_at, \
                 client_record_id = excluded.client_record_id, \
                 client_record_version = excluded.client_record_version, \
                 device_manufacturer = excluded.device_manufacturer, \
                 device_model = excluded.device_model, \
                 device_kind = excluded.device_kind, \
                 fetched_at = excluded.fetched_at, \
                 value = excluded.value, \
                 value_secondary = excluded.value_secondary, \
                 detail = excluded.detail",
            );

            let result = qb.build().execute(&self.pool).await?;
            affected += result.rows_affected();
        }

        Ok(affected)
    }

    pub async fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> Result<Option<ScalarEntity>, sqlx::Error> {
        sqlx::query_as::<_, ScalarEntity>(&format!(
            "SELECT * FROM {} WHERE natural_key = ?",
            self.table()
        ))
        .bind(natural_key)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<ScalarEntity>, sqlx::Error> {
        sqlx::query_as::<_, ScalarEntity>(&format!(
            "SELECT * FROM {} ORDER BY start_time",
            self.table()
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table()))
            .fetch_one(&self.pool)
            .await
    }
}
