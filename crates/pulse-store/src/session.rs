//! Store operations for composite session types
//!
//! A session record is a parent row plus dependent child interval rows
//! (sleep stages, exercise segments). Parent and children commit in one
//! transaction per record: a failure on any part rolls the whole record
//! back and surfaces the error to the processor.

use sqlx::SqlitePool;

use pulse_common::registry::MetricType;

use crate::entity::{SessionChildEntity, SessionEntity, SessionRow};

/// Store for one composite session type
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    metric_type: MetricType,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, metric_type: MetricType) -> Self {
        Self { pool, metric_type }
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    fn table(&self) -> &'static str {
        self.metric_type.table()
    }

    fn child_table(&self) -> String {
        format!("{}_intervals", self.table())
    }

    /// Replace one session and its children atomically
    pub async fn replace_with_children(&self, row: &SessionRow) -> Result<(), sqlx::Error> {
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
             device_manufacturer, device_model, device_kind, fetched_at, \
             title, notes, activity) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
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
        .bind(&row.title)
        .bind(&row.notes)
        .bind(&row.activity)
        .execute(&mut *tx)
        .await?;

        for child in &row.children {
            sqlx::query(&format!(
                "INSERT INTO {} (parent_key, seq, start_time, end_time, kind, amount) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                self.child_table()
            ))
            .bind(&row.meta.natural_key)
            .bind(child.seq)
            .bind(child.start_time)
            .bind(child.end_time)
            .bind(&child.kind)
            .bind(child.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    pub async fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> Result<Option<SessionEntity>, sqlx::Error> {
        sqlx::query_as::<_, SessionEntity>(&format!(
            "SELECT * FROM {} WHERE natural_key = ?",
            self.table()
        ))
        .bind(natural_key)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<SessionEntity>, sqlx::Error> {
        sqlx::query_as::<_, SessionEntity>(&format!(
            "SELECT * FROM {} ORDER BY start_time",
            self.table()
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Children of one session, in session order
    pub async fn children_for(
        &self,
        natural_key: &str,
    ) -> Result<Vec<SessionChildEntity>, sqlx::Error> {
        sqlx::query_as::<_, SessionChildEntity>(&format!(
            "SELECT * FROM {} WHERE parent_key = ? ORDER BY seq",
            self.child_table()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{RecordMeta, SessionChildRow};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pulse_common::record::Provenance;

    fn session_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap()
    }

    fn row(key: &str, children: Vec<SessionChildRow>) -> SessionRow {
        let start = session_start();
        SessionRow {
            meta: RecordMeta {
                natural_key: key.to_string(),
                start_time: start,
                end_time: Some(start + Duration::hours(8)),
                zone_offset: Some("+01:00".to_string()),
                provenance: Provenance {
                    origin_id: "com.example.tracker".to_string(),
                    last_modified_at: start,
                    client_record_id: None,
                    client_record_version: 0,
                    device: None,
                },
                fetched_at: start + Duration::hours(9),
            },
            title: Some("Night sleep".to_string()),
            notes: None,
            activity: None,
            children,
        }
    }

    fn stage(seq: i64, offset_hours: i64, length_hours: i64) -> SessionChildRow {
        let start = session_start() + Duration::hours(offset_hours);
        SessionChildRow {
            seq,
            start_time: start,
            end_time: start + Duration::hours(length_hours),
            kind: "deep".to_string(),
            amount: None,
        }
    }

    async fn store() -> SessionStore {
        let pool = crate::memory().await.unwrap();
        crate::schema::init(&pool).await.unwrap();
        SessionStore::new(pool, MetricType::SleepSession)
    }

    #[tokio::test]
    async fn test_replace_inserts_parent_and_children() {
        let store = store().await;
        store
            .replace_with_children(&row("s-1", vec![stage(0, 0, 2), stage(1, 2, 4)]))
            .await
            .unwrap();

        let entity = store.get_by_natural_key("s-1").await.unwrap().unwrap();
        assert_eq!(entity.title.as_deref(), Some("Night sleep"));
        assert_eq!(store.children_for("s-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_same_key_replaces_children() {
        let store = store().await;
        store
            .replace_with_children(&row("s-1", vec![stage(0, 0, 2), stage(1, 2, 4)]))
            .await
            .unwrap();
        store
            .replace_with_children(&row("s-1", vec![stage(0, 0, 8)]))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.children_for("s-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_child_rolls_back_whole_record() {
        let store = store().await;

        // Second child has end <= start, which violates the interval check
        let bad_child = SessionChildRow {
            seq: 1,
            start_time: session_start(),
            end_time: session_start(),
            kind: "light".to_string(),
            amount: None,
        };
        let result = store
            .replace_with_children(&row("s-bad", vec![stage(0, 0, 2), bad_child]))
            .await;

        assert!(result.is_err());
        assert!(store.get_by_natural_key("s-bad").await.unwrap().is_none());
        assert!(store.children_for("s-bad").await.unwrap().is_empty());
    }
}
