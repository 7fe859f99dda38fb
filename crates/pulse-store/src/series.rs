//! Store operations for sample-bearing series types
//!
//! A series record commits as one parent row plus one child row per sample,
//! inside a single transaction. Replacement deletes the previous parent
//! first, which cascades to its samples, so a re-commit never leaves stale
//! sample rows behind.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use pulse_common::registry::MetricType;

use crate::entity::{SampleEntity, SeriesEntity, SeriesRow};

const SAMPLE_CHUNK_SIZE: usize = 150;

/// Store for one series metric type
#[derive(Debug, Clone)]
pub struct SeriesStore {
    pool: SqlitePool,
    metric_type: MetricType,
}

impl SeriesStore {
    pub fn new(pool: SqlitePool, metric_type: MetricType) -> Self {
        Self { pool, metric_type }
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    fn table(&self) -> &'static str {
        self.metric_type.table()
    }

    fn sample_table(&self) -> String {
        format!("{}_samples", self.table())
    }

    /// Replace one record and its samples atomically
    pub async fn replace_with_samples(&self, row: &SeriesRow) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "DELETE FROM {} WHERE natural_key = ?",
            self.table()
        ))
        .bind(&row.meta.natural_key)
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!(
            "INSERT INTO {} (natural_key, start_time, end_time, zone_offset, \
             origin_id, last_modified_at, client_record_id, client_record_version, \
             device_manufacturer, device_model, device_kind, fetched_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.table()
        ))
        .bind(&row.meta.natural_key)
        .bind(row.meta.start_time)
        .bind(row.meta.end_time)
        .bind(&row.meta.zone_offset)
        .bind(&row.meta.provenance.origin_id)
        .bind(row.meta.provenance.last_modified_at)
        .bind(&row.meta.provenance.client_record_id)
        .bind(row.meta.provenance.client_record_version)
        .bind(row.meta.device_manufacturer())
        .bind(row.meta.device_model())
        .bind(row.meta.device_kind())
        .bind(row.meta.fetched_at)
        .execute(&mut *tx)
        .await?;

        for (chunk_index, chunk) in row.samples.chunks(SAMPLE_CHUNK_SIZE).enumerate() {
            let base_seq = (chunk_index * SAMPLE_CHUNK_SIZE) as i64;
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO {} (parent_key, seq, sampled_at, value) ",
                self.sample_table()
            ));

            qb.push_values(chunk.iter().enumerate(), |mut b, (offset, (at, value))| {
                b.push_bind(row.meta.natural_key.clone())
                    .push_bind(base_seq + offset as i64)
                    .push_bind(*at)
                    .push_bind(*value);
            });

            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await
    }

    pub async fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> Result<Option<SeriesEntity>, sqlx::Error> {
        sqlx::query_as::<_, SeriesEntity>(&format!(
            "SELECT * FROM {} WHERE natural_key = ?",
            self.table()
        ))
        .bind(natural_key)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<SeriesEntity>, sqlx::Error> {
        sqlx::query_as::<_, SeriesEntity>(&format!(
            "SELECT * FROM {} ORDER BY start_time",
            self.table()
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Samples of one record, in series order
    pub async fn samples_for(
        &self,
        natural_key: &str,
    ) -> Result<Vec<SampleEntity>, sqlx::Error> {
        sqlx::query_as::<_, SampleEntity>(&format!(
            "SELECT * FROM {} WHERE parent_key = ? ORDER BY seq",
            self.sample_table()
        ))
        .bind(natural_key)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table()))
            .fetch_one(&self.pool)
            .await
    }
}
