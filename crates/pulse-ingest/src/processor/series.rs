//! Commit strategy for sample-bearing series types
//!
//! Each record commits as parent row plus expanded per-sample rows in one
//! transaction. A failed record halts the file; earlier records stay
//! committed, and the file remains in staging for retry.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use pulse_common::record::{CanonicalRecord, MetricPayload, Sample};
use pulse_common::registry::MetricType;
use pulse_store::entity::SeriesRow;
use pulse_store::SeriesStore;

use super::{ensure_type, record_meta, ProcessStats, Processor};
use crate::error::CommitError;
use crate::staging::StagingArea;

pub struct SeriesProcessor {
    store: SeriesStore,
}

impl SeriesProcessor {
    pub fn new(store: SeriesStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Processor for SeriesProcessor {
    fn metric_type(&self) -> MetricType {
        self.store.metric_type()
    }

    async fn process(&self, file: &Path) -> Result<ProcessStats, CommitError> {
        let batch = StagingArea::read_batch(file)?;
        let mut committed = 0;

        for record in &batch.records {
            ensure_type(record, self.metric_type())?;
            let row = series_row(record)?;
            self.store.replace_with_samples(&row).await?;
            committed += 1;
        }

        info!(
            metric_type = %self.metric_type(),
            records = committed,
            file = %file.display(),
            "series file committed"
        );
        Ok(ProcessStats {
            records_committed: committed,
        })
    }
}

fn series_row(record: &CanonicalRecord) -> Result<SeriesRow, CommitError> {
    let samples: &[Sample] = match &record.payload {
        MetricPayload::HeartRateSeries { samples }
        | MetricPayload::SpeedSeries { samples }
        | MetricPayload::PowerSeries { samples }
        | MetricPayload::CadenceSeries { samples } => samples,
        other => {
            return Err(CommitError::Decode {
                natural_key: record.natural_key.clone(),
                reason: format!("{} is not a series metric", other.metric_type()),
            })
        },
    };

    Ok(SeriesRow {
        meta: record_meta(record),
        samples: samples.iter().map(|s| (s.at, s.value)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pulse_common::record::{Provenance, RecordTime};
    use tempfile::TempDir;

    fn record(key: &str, sample_values: &[f64]) -> CanonicalRecord {
        let start = Utc.with_ymd_and_hms(2026, 1, 2, 7, 0, 0).unwrap();
        CanonicalRecord {
            natural_key: key.to_string(),
            time: RecordTime::Interval {
                start,
                end: start + Duration::minutes(5),
            },
            zone_offset: None,
            payload: MetricPayload::HeartRateSeries {
                samples: sample_values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Sample {
                        at: start + Duration::seconds(i as i64),
                        value: *v,
                    })
                    .collect(),
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

    #[tokio::test]
    async fn test_process_expands_samples() {
        let pool = pulse_store::memory().await.unwrap();
        pulse_store::schema::init(&pool).await.unwrap();
        let store = SeriesStore::new(pool, MetricType::HeartRateSeries);
        let processor = SeriesProcessor::new(store.clone());

        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path().join("staging"), dir.path().join("completed"))
            .unwrap();
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let path = area
            .write_batch(
                MetricType::HeartRateSeries,
                created_at,
                &[record("hr-1", &[61.0, 63.0, 62.0])],
            )
            .unwrap()
            .unwrap();

        let stats = processor.process(&path).await.unwrap();
        assert_eq!(stats.records_committed, 1);

        let samples = store.samples_for("hr-1").await.unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].value, 63.0);
        assert_eq!(samples[1].parent_key, "hr-1");
    }

    #[tokio::test]
    async fn test_reprocessing_replaces_not_duplicates() {
        let pool = pulse_store::memory().await.unwrap();
        pulse_store::schema::init(&pool).await.unwrap();
        let store = SeriesStore::new(pool, MetricType::HeartRateSeries);
        let processor = SeriesProcessor::new(store.clone());

        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path().join("staging"), dir.path().join("completed"))
            .unwrap();
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let path = area
            .write_batch(
                MetricType::HeartRateSeries,
                created_at,
                &[record("hr-1", &[61.0, 63.0])],
            )
            .unwrap()
            .unwrap();

        processor.process(&path).await.unwrap();
        processor.process(&path).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.samples_for("hr-1").await.unwrap().len(), 2);
    }
}
