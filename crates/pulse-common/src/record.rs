//! Canonical metric record model
//!
//! The canonical record is the type-agnostic snapshot that flows from a
//! fetcher, through a staging file, into a processor. It is flat and fully
//! serde-serializable: external identity (`natural_key`), time coverage,
//! typed payload, and fetch provenance. The typed payload is a tagged union
//! with one variant per [`MetricType`], so a record always knows which
//! registry entry it belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::MetricType;

/// Time coverage of one record: a single instant or a half-open interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RecordTime {
    Instant { at: DateTime<Utc> },
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RecordTime {
    /// Start of coverage (the instant itself for instant records)
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            RecordTime::Instant { at } => *at,
            RecordTime::Interval { start, .. } => *start,
        }
    }

    /// End of coverage, if the record spans an interval
    pub fn end(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTime::Instant { .. } => None,
            RecordTime::Interval { end, .. } => Some(*end),
        }
    }
}

/// Device that produced the external record, when the provider reports one
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Device {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub kind: Option<String>,
}

/// Fetch provenance copied verbatim from the external record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the source application or package
    pub origin_id: String,
    /// Last modification time reported by the provider
    pub last_modified_at: DateTime<Utc>,
    /// Client-assigned record id, when present
    pub client_record_id: Option<String>,
    /// Client-assigned record version; 0 when the provider omits it
    pub client_record_version: i64,
    /// Producing device, when reported
    pub device: Option<Device>,
}

/// One timestamped sample inside a series record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// One stage interval inside a sleep session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepStage {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stage: String,
}

/// One segment inside an exercise session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub segment_type: String,
    pub repetitions: Option<i64>,
}

/// Typed payload of a canonical record, one variant per metric type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricPayload {
    Weight { kilograms: f64 },
    Height { meters: f64 },
    BodyFat { percentage: f64 },
    BodyTemperature { celsius: f64 },
    RestingHeartRate { beats_per_minute: i64 },
    BloodGlucose {
        millimoles_per_liter: f64,
        relation_to_meal: Option<String>,
    },
    BloodPressure {
        systolic_mmhg: f64,
        diastolic_mmhg: f64,
    },
    OxygenSaturation { percentage: f64 },
    Vo2Max { ml_per_minute_per_kg: f64 },
    HeartRateVariability { rmssd_millis: f64 },
    Steps { count: i64 },
    Distance { meters: f64 },
    ActiveCalories { kilocalories: f64 },
    TotalCalories { kilocalories: f64 },
    Hydration { liters: f64 },
    FloorsClimbed { floors: f64 },
    HeartRateSeries { samples: Vec<Sample> },
    SpeedSeries { samples: Vec<Sample> },
    PowerSeries { samples: Vec<Sample> },
    CadenceSeries { samples: Vec<Sample> },
    SleepSession {
        title: Option<String>,
        notes: Option<String>,
        stages: Vec<SleepStage>,
    },
    ExerciseSession {
        exercise_type: String,
        title: Option<String>,
        segments: Vec<ExerciseSegment>,
    },
}

impl MetricPayload {
    /// The registry entry this payload belongs to
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricPayload::Weight { .. } => MetricType::Weight,
            MetricPayload::Height { .. } => MetricType::Height,
            MetricPayload::BodyFat { .. } => MetricType::BodyFat,
            MetricPayload::BodyTemperature { .. } => MetricType::BodyTemperature,
            MetricPayload::RestingHeartRate { .. } => MetricType::RestingHeartRate,
            MetricPayload::BloodGlucose { .. } => MetricType::BloodGlucose,
            MetricPayload::BloodPressure { .. } => MetricType::BloodPressure,
            MetricPayload::OxygenSaturation { .. } => MetricType::OxygenSaturation,
            MetricPayload::Vo2Max { .. } => MetricType::Vo2Max,
            MetricPayload::HeartRateVariability { .. } => MetricType::HeartRateVariability,
            MetricPayload::Steps { .. } => MetricType::Steps,
            MetricPayload::Distance { .. } => MetricType::Distance,
            MetricPayload::ActiveCalories { .. } => MetricType::ActiveCalories,
            MetricPayload::TotalCalories { .. } => MetricType::TotalCalories,
            MetricPayload::Hydration { .. } => MetricType::Hydration,
            MetricPayload::FloorsClimbed { .. } => MetricType::FloorsClimbed,
            MetricPayload::HeartRateSeries { .. } => MetricType::HeartRateSeries,
            MetricPayload::SpeedSeries { .. } => MetricType::SpeedSeries,
            MetricPayload::PowerSeries { .. } => MetricType::PowerSeries,
            MetricPayload::CadenceSeries { .. } => MetricType::CadenceSeries,
            MetricPayload::SleepSession { .. } => MetricType::SleepSession,
            MetricPayload::ExerciseSession { .. } => MetricType::ExerciseSession,
        }
    }
}

/// Canonical snapshot of one external record plus fetch provenance
///
/// `natural_key` is the externally-assigned identifier, unique within the
/// record's type and stable across repeated fetches of overlapping windows.
/// Commit is idempotent on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub natural_key: String,
    pub time: RecordTime,
    /// UTC offset of the recording, e.g. "+02:00"
    pub zone_offset: Option<String>,
    pub payload: MetricPayload,
    pub provenance: Provenance,
    /// Stamped by the fetcher when the record was pulled
    pub fetched_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// The registry entry this record belongs to
    pub fn metric_type(&self) -> MetricType {
        self.payload.metric_type()
    }
}
