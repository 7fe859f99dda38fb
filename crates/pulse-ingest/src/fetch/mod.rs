//! Per-type fetch strategies
//!
//! A [`Fetcher`] pulls one type's records for a time window and maps them to
//! canonical records. All registry types share a single generic
//! [`MappedFetcher`] parameterized by a payload-mapping function; the
//! [`FetcherFactory`] resolves a type to its strategy and fails fast at
//! startup if any registry entry lacks one.

pub mod mappers;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use pulse_common::record::{CanonicalRecord, Device, MetricPayload, Provenance, RecordTime};
use pulse_common::registry::{MetricType, TimeShape};
use pulse_common::time::TimeWindow;
use pulse_common::PulseError;

use crate::error::FetchError;
use crate::provider::{ExternalRecord, ProviderClient};

/// Maps one external record to this type's payload
pub type PayloadMapper = fn(&ExternalRecord) -> Result<MetricPayload, FetchError>;

/// Fetches and canonicalizes one type's records for a time window
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn metric_type(&self) -> MetricType;

    /// Pull records intersecting `window` and map them to canonical records
    async fn fetch_and_map(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<CanonicalRecord>, FetchError>;
}

/// Generic fetcher: provider call plus a per-type payload mapping
pub struct MappedFetcher {
    metric_type: MetricType,
    client: Arc<ProviderClient>,
    map: PayloadMapper,
}

impl MappedFetcher {
    pub fn new(metric_type: MetricType, client: Arc<ProviderClient>) -> Self {
        Self {
            metric_type,
            client,
            map: mappers::payload_mapper(metric_type),
        }
    }

    fn canonicalize(&self, record: ExternalRecord) -> Result<CanonicalRecord, FetchError> {
        let time = match self.metric_type.time_shape() {
            TimeShape::Instant => RecordTime::Instant {
                at: record.start_time,
            },
            TimeShape::Interval => RecordTime::Interval {
                start: record.start_time,
                end: record.end_time.ok_or_else(|| FetchError::MissingField {
                    natural_key: record.id.clone(),
                    field: "endTime",
                })?,
            },
        };

        let payload = (self.map)(&record)?;

        Ok(CanonicalRecord {
            natural_key: record.id,
            time,
            zone_offset: record.zone_offset,
            payload,
            provenance: Provenance {
                origin_id: record.origin_id,
                last_modified_at: record.last_modified_at,
                client_record_id: record.client_record_id,
                client_record_version: record.client_record_version,
                device: record.device.map(|d| Device {
                    manufacturer: d.manufacturer,
                    model: d.model,
                    kind: d.kind,
                }),
            },
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Fetcher for MappedFetcher {
    fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    async fn fetch_and_map(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<CanonicalRecord>, FetchError> {
        let external = self.client.read_records(self.metric_type, window).await?;

        external
            .into_iter()
            .map(|record| self.canonicalize(record))
            .collect()
    }
}

/// Resolves a metric type to its fetch strategy
///
/// Built once at startup; an unregistered type is a configuration error and
/// aborts construction.
pub struct FetcherFactory {
    fetchers: HashMap<MetricType, Arc<dyn Fetcher>>,
}

impl FetcherFactory {
    pub fn new(client: Arc<ProviderClient>) -> Result<Self, PulseError> {
        let mut fetchers: HashMap<MetricType, Arc<dyn Fetcher>> = HashMap::new();
        for metric_type in MetricType::ALL {
            fetchers.insert(
                *metric_type,
                Arc::new(MappedFetcher::new(*metric_type, client.clone())),
            );
        }

        let factory = Self { fetchers };
        factory.ensure_complete()?;
        Ok(factory)
    }

    fn ensure_complete(&self) -> Result<(), PulseError> {
        for metric_type in MetricType::ALL {
            if !self.fetchers.contains_key(metric_type) {
                return Err(PulseError::Config(format!(
                    "no fetcher registered for metric type {metric_type}"
                )));
            }
        }
        Ok(())
    }

    pub fn resolve(&self, metric_type: MetricType) -> Option<Arc<dyn Fetcher>> {
        self.fetchers.get(&metric_type).cloned()
    }
}
