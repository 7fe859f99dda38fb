//! Commit strategy for single-table scalar types
//!
//! Maps each canonical record to one scalar row and commits the whole file
//! in batched upserts keyed on natural_key.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use pulse_common::record::{CanonicalRecord, MetricPayload};
use pulse_common::registry::MetricType;
use pulse_store::entity::ScalarRow;
use pulse_store::ScalarStore;

use super::{ensure_type, record_meta, ProcessStats, Processor};
use crate::error::CommitError;
use crate::staging::StagingArea;

pub struct ScalarProcessor {
    store: ScalarStore,
    batch_size: usize,
}

impl ScalarProcessor {
    pub fn new(store: ScalarStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl Processor for ScalarProcessor {
    fn metric_type(&self) -> MetricType {
        self.store.metric_type()
    }

    async fn process(&self, file: &Path) -> Result<ProcessStats, CommitError> {
        let batch = StagingArea::read_batch(file)?;

        let rows = batch
            .records
            .iter()
            .map(|record| {
                ensure_type(record, self.metric_type())?;
                scalar_row(record)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for chunk in rows.chunks(self.batch_size) {
            self.store.upsert_batch(chunk).await?;
        }

        info!(
            metric_type = %self.metric_type(),
            records = rows.len(),
            file = %file.display(),
            "scalar file committed"
        );
        Ok(ProcessStats {
            records_committed: rows.len(),
        })
    }
}

/// Collapse a scalar payload into the shared column shape
fn scalar_row(record: &CanonicalRecord) -> Result<ScalarRow, CommitError> {
    let (value, value_secondary, detail) = match &record.payload {
        MetricPayload::Weight { kilograms } => (*kilograms, None, None),
        MetricPayload::Height { meters } => (*meters, None, None),
        MetricPayload::BodyFat { percentage } => (*percentage, None, None),
        MetricPayload::BodyTemperature { celsius } => (*celsius, None, None),
        MetricPayload::RestingHeartRate { beats_per_minute } => {
            (*beats_per_minute as f64, None, None)
        },
        MetricPayload::BloodGlucose {
            millimoles_per_liter,
            relation_to_meal,
        } => (*millimoles_per_liter, None, relation_to_meal.clone()),
        MetricPayload::BloodPressure {
            systolic_mmhg,
            diastolic_mmhg,
        } => (*systolic_mmhg, Some(*diastolic_mmhg), None),
        MetricPayload::OxygenSaturation { percentage } => (*percentage, None, None),
        MetricPayload::Vo2Max {
            ml_per_minute_per_kg,
        } => (*ml_per_minute_per_kg, None, None),
        MetricPayload::HeartRateVariability { rmssd_millis } => (*rmssd_millis, None, None),
        MetricPayload::Steps { count } => (*count as f64, None, None),
        MetricPayload::Distance { meters } => (*meters, None, None),
        MetricPayload::ActiveCalories { kilocalories } => (*kilocalories, None, None),
        MetricPayload::TotalCalories { kilocalories } => (*kilocalories, None, None),
        MetricPayload::Hydration { liters } => (*liters, None, None),
        MetricPayload::FloorsClimbed { floors } => (*floors, None, None),
        other => {
            return Err(CommitError::Decode {
                natural_key: record.natural_key.clone(),
                reason: format!("{} is not a scalar metric", other.metric_type()),
            })
        },
    };

    Ok(ScalarRow {
        meta: record_meta(record),
        value,
        value_secondary,
        detail,
    })
}
