//! Row types exchanged with the store
//!
//! `*Row` structs are the write-side shape a processor hands to a store;
//! `*Entity` structs are the read-side shape queried back out, including the
//! generated rowid. Provenance travels as the shared canonical sub-record on
//! the way in and as flat columns on the way out.

use chrono::{DateTime, Utc};
use pulse_common::record::Provenance;
use sqlx::FromRow;

/// Write-side fields common to every parent row
#[derive(Debug, Clone)]
pub struct RecordMeta {
    pub natural_key: String,
    pub start_time: DateTime<Utc>,
    /// None for instant records
    pub end_time: Option<DateTime<Utc>>,
    pub zone_offset: Option<String>,
    pub provenance: Provenance,
    pub fetched_at: DateTime<Utc>,
}

impl RecordMeta {
    pub fn device_manufacturer(&self) -> Option<String> {
        self.provenance
            .device
            .as_ref()
            .and_then(|d| d.manufacturer.clone())
    }

    pub fn device_model(&self) -> Option<String> {
        self.provenance
            .device
            .as_ref()
            .and_then(|d| d.model.clone())
    }

    pub fn device_kind(&self) -> Option<String> {
        self.provenance.device.as_ref().and_then(|d| d.kind.clone())
    }
}

/// Write-side row for a scalar type
///
/// `value_secondary` carries the second reading of two-valued types
/// (blood-pressure diastolic); `detail` carries a textual qualifier
/// (blood-glucose meal relation). Both are None for plain scalars.
#[derive(Debug, Clone)]
pub struct ScalarRow {
    pub meta: RecordMeta,
    pub value: f64,
    pub value_secondary: Option<f64>,
    pub detail: Option<String>,
}

/// Write-side parent row for a series type
#[derive(Debug, Clone)]
pub struct SeriesRow {
    pub meta: RecordMeta,
    /// Ordered samples, expanded into child rows on commit
    pub samples: Vec<(DateTime<Utc>, f64)>,
}

/// Write-side child row for a session type
#[derive(Debug, Clone)]
pub struct SessionChildRow {
    pub seq: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Stage name for sleep, segment type for exercise
    pub kind: String,
    /// Repetition count where the segment carries one
    pub amount: Option<i64>,
}

/// Write-side parent row for a session type
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub meta: RecordMeta,
    pub title: Option<String>,
    pub notes: Option<String>,
    /// Exercise type for exercise sessions, None for sleep
    pub activity: Option<String>,
    pub children: Vec<SessionChildRow>,
}

/// Committed scalar record, as queried back from the store
#[derive(Debug, Clone, FromRow)]
pub struct ScalarEntity {
    pub id: i64,
    pub natural_key: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub zone_offset: Option<String>,
    pub value: f64,
    pub value_secondary: Option<f64>,
    pub detail: Option<String>,
    pub origin_id: String,
    pub last_modified_at: DateTime<Utc>,
    pub client_record_id: Option<String>,
    pub client_record_version: i64,
    pub device_manufacturer: Option<String>,
    pub device_model: Option<String>,
    pub device_kind: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Committed series parent record
#[derive(Debug, Clone, FromRow)]
pub struct SeriesEntity {
    pub id: i64,
    pub natural_key: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub zone_offset: Option<String>,
    pub origin_id: String,
    pub last_modified_at: DateTime<Utc>,
    pub client_record_id: Option<String>,
    pub client_record_version: i64,
    pub device_manufacturer: Option<String>,
    pub device_model: Option<String>,
    pub device_kind: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Committed per-sample child row
#[derive(Debug, Clone, FromRow)]
pub struct SampleEntity {
    pub id: i64,
    pub parent_key: String,
    pub seq: i64,
    pub sampled_at: DateTime<Utc>,
    pub value: f64,
}

/// Committed session parent record
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
    pub id: i64,
    pub natural_key: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub zone_offset: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub activity: Option<String>,
    pub origin_id: String,
    pub last_modified_at: DateTime<Utc>,
    pub client_record_id: Option<String>,
    pub client_record_version: i64,
    pub device_manufacturer: Option<String>,
    pub device_model: Option<String>,
    pub device_kind: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Committed session child interval row
#[derive(Debug, Clone, FromRow)]
pub struct SessionChildEntity {
    pub id: i64,
    pub parent_key: String,
    pub seq: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub kind: String,
    pub amount: Option<i64>,
}
