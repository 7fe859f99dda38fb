//! Commit strategy for composite session types
//!
//! Sleep stages and exercise segments become child interval rows under the
//! session parent, committed per record in one transaction. A record whose
//! children violate the store's constraints rolls back whole and halts the
//! file; records committed before it stay committed.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use pulse_common::record::{CanonicalRecord, MetricPayload};
use pulse_common::registry::MetricType;
use pulse_store::entity::{SessionChildRow, SessionRow};
use pulse_store::SessionStore;

use super::{ensure_type, record_meta, ProcessStats, Processor};
use crate::error::CommitError;
use crate::staging::StagingArea;

pub struct SessionProcessor {
    store: SessionStore,
}

impl SessionProcessor {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Processor for SessionProcessor {
    fn metric_type(&self) -> MetricType {
        self.store.metric_type()
    }

    async fn process(&self, file: &Path) -> Result<ProcessStats, CommitError> {
        let batch = StagingArea::read_batch(file)?;
        let mut committed = 0;

        for record in &batch.records {
            ensure_type(record, self.metric_type())?;
            let row = session_row(record)?;
            self.store.replace_with_children(&row).await?;
            committed += 1;
        }

        info!(
            metric_type = %self.metric_type(),
            records = committed,
            file = %file.display(),
            "session file committed"
        );
        Ok(ProcessStats {
            records_committed: committed,
        })
    }
}

fn session_row(record: &CanonicalRecord) -> Result<SessionRow, CommitError> {
    let meta = record_meta(record);
    match &record.payload {
        MetricPayload::SleepSession {
            title,
            notes,
            stages,
        } => Ok(SessionRow {
            meta,
            title: title.clone(),
            notes: notes.clone(),
            activity: None,
            children: stages
                .iter()
                .enumerate()
                .map(|(seq, stage)| SessionChildRow {
                    seq: seq as i64,
                    start_time: stage.start,
                    end_time: stage.end,
                    kind: stage.stage.clone(),
                    amount: None,
                })
                .collect(),
        }),
        MetricPayload::ExerciseSession {
            exercise_type,
            title,
            segments,
        } => Ok(SessionRow {
            meta,
            title: title.clone(),
            notes: None,
            activity: Some(exercise_type.clone()),
            children: segments
                .iter()
                .enumerate()
                .map(|(seq, segment)| SessionChildRow {
                    seq: seq as i64,
                    start_time: segment.start,
                    end_time: segment.end,
                    kind: segment.segment_type.clone(),
                    amount: segment.repetitions,
                })
                .collect(),
        }),
        other => Err(CommitError::Decode {
            natural_key: record.natural_key.clone(),
            reason: format!("{} is not a session metric", other.metric_type()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pulse_common::record::{Provenance, RecordTime, SleepStage};
    use tempfile::TempDir;

    fn stage(start: DateTime<Utc>, minutes: i64, name: &str) -> SleepStage {
        SleepStage {
            start,
            end: start + Duration::minutes(minutes),
            stage: name.to_string(),
        }
    }

    fn sleep_record(key: &str, stages: Vec<SleepStage>) -> CanonicalRecord {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
        CanonicalRecord {
            natural_key: key.to_string(),
            time: RecordTime::Interval {
                start,
                end: start + Duration::hours(8),
            },
            zone_offset: Some("+01:00".to_string()),
            payload: MetricPayload::SleepSession {
                title: Some("Night".to_string()),
                notes: None,
                stages,
            },
            provenance: Provenance {
                origin_id: "com.example.tracker".to_string(),
                last_modified_at: start,
                client_record_id: None,
                client_record_version: 0,
                device: None,
            },
            fetched_at: start,
        }
    }

    async fn setup() -> (SessionStore, SessionProcessor, TempDir, StagingArea) {
        let pool = pulse_store::memory().await.unwrap();
        pulse_store::schema::init(&pool).await.unwrap();
        let store = SessionStore::new(pool, MetricType::SleepSession);
        let processor = SessionProcessor::new(store.clone());
        let dir = TempDir::new().unwrap();
        let area =
            StagingArea::new(dir.path().join("staging"), dir.path().join("completed")).unwrap();
        (store, processor, dir, area)
    }

    #[tokio::test]
    async fn test_process_commits_stages_as_children() {
        let (store, processor, _dir, area) = setup().await;
        let night = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let path = area
            .write_batch(
                MetricType::SleepSession,
                created_at,
                &[sleep_record(
                    "sleep-1",
                    vec![
                        stage(night, 90, "deep"),
                        stage(night + Duration::minutes(90), 30, "rem"),
                    ],
                )],
            )
            .unwrap()
            .unwrap();

        let stats = processor.process(&path).await.unwrap();
        assert_eq!(stats.records_committed, 1);

        let children = store.children_for("sleep-1").await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind, "deep");
        assert_eq!(children[1].kind, "rem");
        assert!(children.iter().all(|c| c.amount.is_none()));
    }

    #[tokio::test]
    async fn test_invalid_child_halts_file_keeps_earlier_records() {
        let (store, processor, _dir, area) = setup().await;
        let night = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
        let bad = SleepStage {
            start: night,
            end: night, // violates end > start
            stage: "light".to_string(),
        };
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let path = area
            .write_batch(
                MetricType::SleepSession,
                created_at,
                &[
                    sleep_record("sleep-1", vec![stage(night, 60, "deep")]),
                    sleep_record("sleep-2", vec![stage(night, 30, "light"), bad]),
                    sleep_record("sleep-3", vec![stage(night, 45, "rem")]),
                ],
            )
            .unwrap()
            .unwrap();

        let err = processor.process(&path).await.unwrap_err();
        assert!(matches!(err, CommitError::Store(_)));

        // record 1 committed, record 2 rolled back whole, record 3 never reached
        assert!(store.get_by_natural_key("sleep-1").await.unwrap().is_some());
        assert!(store.get_by_natural_key("sleep-2").await.unwrap().is_none());
        assert!(store.children_for("sleep-2").await.unwrap().is_empty());
        assert!(store.get_by_natural_key("sleep-3").await.unwrap().is_none());
        // file stays in staging for retry
        assert!(path.exists());
    }
}
