//! Per-type commit strategies
//!
//! A [`Processor`] decodes one staging file and commits its records into the
//! store. Three generic strategies cover the registry: batched upserts for
//! scalar types, per-record parent+samples transactions for series types,
//! and per-record parent+children transactions for composite session types.
//! The [`ProcessorFactory`] resolves a type to its strategy and fails fast
//! at startup if any registry entry lacks one.

pub mod scalar;
pub mod series;
pub mod session;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use pulse_common::record::CanonicalRecord;
use pulse_common::registry::{MetricKind, MetricType};
use pulse_common::PulseError;
use pulse_store::entity::RecordMeta;
use pulse_store::{ScalarStore, SeriesStore, SessionStore};

use crate::error::CommitError;

pub use scalar::ScalarProcessor;
pub use series::SeriesProcessor;
pub use session::SessionProcessor;

/// Outcome of committing one staging file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStats {
    pub records_committed: usize,
}

/// Decodes one staging file and commits its records
#[async_trait]
pub trait Processor: Send + Sync {
    fn metric_type(&self) -> MetricType;

    /// Commit every record in `file`; on error the file must stay in staging
    async fn process(&self, file: &Path) -> Result<ProcessStats, CommitError>;
}

/// Write-side meta shared by all strategies
pub(crate) fn record_meta(record: &CanonicalRecord) -> RecordMeta {
    RecordMeta {
        natural_key: record.natural_key.clone(),
        start_time: record.time.start(),
        end_time: record.time.end(),
        zone_offset: record.zone_offset.clone(),
        provenance: record.provenance.clone(),
        fetched_at: record.fetched_at,
    }
}

/// Guard against a record of the wrong type slipping into a file
pub(crate) fn ensure_type(
    record: &CanonicalRecord,
    expected: MetricType,
) -> Result<(), CommitError> {
    if record.metric_type() != expected {
        return Err(CommitError::Decode {
            natural_key: record.natural_key.clone(),
            reason: format!(
                "payload is {} but file is {expected}",
                record.metric_type()
            ),
        });
    }
    Ok(())
}

/// Resolves a metric type to its commit strategy
pub struct ProcessorFactory {
    processors: HashMap<MetricType, Arc<dyn Processor>>,
}

impl ProcessorFactory {
    pub fn new(pool: SqlitePool, store_batch_size: usize) -> Result<Self, PulseError> {
        let mut processors: HashMap<MetricType, Arc<dyn Processor>> = HashMap::new();

        for metric_type in MetricType::ALL {
            let processor: Arc<dyn Processor> = match metric_type.kind() {
                MetricKind::Scalar => Arc::new(ScalarProcessor::new(
                    ScalarStore::new(pool.clone(), *metric_type),
                    store_batch_size,
                )),
                MetricKind::Series => Arc::new(SeriesProcessor::new(SeriesStore::new(
                    pool.clone(),
                    *metric_type,
                ))),
                MetricKind::Session => Arc::new(SessionProcessor::new(SessionStore::new(
                    pool.clone(),
                    *metric_type,
                ))),
            };
            processors.insert(*metric_type, processor);
        }

        let factory = Self { processors };
        factory.ensure_complete()?;
        Ok(factory)
    }

    fn ensure_complete(&self) -> Result<(), PulseError> {
        for metric_type in MetricType::ALL {
            if !self.processors.contains_key(metric_type) {
                return Err(PulseError::Config(format!(
                    "no processor registered for metric type {metric_type}"
                )));
            }
        }
        Ok(())
    }

    pub fn resolve(&self, metric_type: MetricType) -> Option<Arc<dyn Processor>> {
        self.processors.get(&metric_type).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_covers_every_registry_type() {
        let pool = pulse_store::memory().await.unwrap();
        let factory = ProcessorFactory::new(pool, 100).unwrap();

        for metric_type in MetricType::ALL {
            let processor = factory.resolve(*metric_type).expect("missing processor");
            assert_eq!(processor.metric_type(), *metric_type);
        }
    }
}
