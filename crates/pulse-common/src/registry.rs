//! Static registry of supported metric types
//!
//! Every metric type the pipeline can ingest is a variant of [`MetricType`].
//! Each variant carries the metadata the orchestrators and factories need:
//! the provider permission gating its fetch, the store table its records
//! commit into, and its structural kind. Dispatch is a plain enum match or
//! map lookup; there is no runtime type discovery.
//!
//! The variant name doubles as the staging-file prefix, so it must stay
//! filename-safe and unique.

use serde::{Deserialize, Serialize};

/// Structural kind of a metric type, which selects its processor strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// One value (or value pair) per record, committed in batches
    Scalar,
    /// A record carrying an ordered list of timestamped samples
    Series,
    /// A composite record with dependent child interval rows
    Session,
}

/// Whether records of a type cover an instant or a time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeShape {
    Instant,
    Interval,
}

/// A supported metric type
///
/// The set is fixed at compile time; adding a type means adding a variant
/// here plus one payload mapping in the fetch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    // Instant scalars
    Weight,
    Height,
    BodyFat,
    BodyTemperature,
    RestingHeartRate,
    BloodGlucose,
    BloodPressure,
    OxygenSaturation,
    Vo2Max,
    HeartRateVariability,
    // Interval scalars
    Steps,
    Distance,
    ActiveCalories,
    TotalCalories,
    Hydration,
    FloorsClimbed,
    // Sample-bearing series
    HeartRateSeries,
    SpeedSeries,
    PowerSeries,
    CadenceSeries,
    // Composite sessions
    SleepSession,
    ExerciseSession,
}

impl MetricType {
    /// Every supported type, in the order the orchestrators iterate them
    pub const ALL: &'static [MetricType] = &[
        MetricType::Weight,
        MetricType::Height,
        MetricType::BodyFat,
        MetricType::BodyTemperature,
        MetricType::RestingHeartRate,
        MetricType::BloodGlucose,
        MetricType::BloodPressure,
        MetricType::OxygenSaturation,
        MetricType::Vo2Max,
        MetricType::HeartRateVariability,
        MetricType::Steps,
        MetricType::Distance,
        MetricType::ActiveCalories,
        MetricType::TotalCalories,
        MetricType::Hydration,
        MetricType::FloorsClimbed,
        MetricType::HeartRateSeries,
        MetricType::SpeedSeries,
        MetricType::PowerSeries,
        MetricType::CadenceSeries,
        MetricType::SleepSession,
        MetricType::ExerciseSession,
    ];

    /// Stable type name; also the staging-file prefix
    pub fn name(&self) -> &'static str {
        match self {
            MetricType::Weight => "Weight",
            MetricType::Height => "Height",
            MetricType::BodyFat => "BodyFat",
            MetricType::BodyTemperature => "BodyTemperature",
            MetricType::RestingHeartRate => "RestingHeartRate",
            MetricType::BloodGlucose => "BloodGlucose",
            MetricType::BloodPressure => "BloodPressure",
            MetricType::OxygenSaturation => "OxygenSaturation",
            MetricType::Vo2Max => "Vo2Max",
            MetricType::HeartRateVariability => "HeartRateVariability",
            MetricType::Steps => "Steps",
            MetricType::Distance => "Distance",
            MetricType::ActiveCalories => "ActiveCalories",
            MetricType::TotalCalories => "TotalCalories",
            MetricType::Hydration => "Hydration",
            MetricType::FloorsClimbed => "FloorsClimbed",
            MetricType::HeartRateSeries => "HeartRateSeries",
            MetricType::SpeedSeries => "SpeedSeries",
            MetricType::PowerSeries => "PowerSeries",
            MetricType::CadenceSeries => "CadenceSeries",
            MetricType::SleepSession => "SleepSession",
            MetricType::ExerciseSession => "ExerciseSession",
        }
    }

    /// Provider permission id gating reads of this type
    pub fn permission(&self) -> &'static str {
        match self {
            MetricType::Weight => "read_weight",
            MetricType::Height => "read_height",
            MetricType::BodyFat => "read_body_fat",
            MetricType::BodyTemperature => "read_body_temperature",
            MetricType::RestingHeartRate => "read_resting_heart_rate",
            MetricType::BloodGlucose => "read_blood_glucose",
            MetricType::BloodPressure => "read_blood_pressure",
            MetricType::OxygenSaturation => "read_oxygen_saturation",
            MetricType::Vo2Max => "read_vo2_max",
            MetricType::HeartRateVariability => "read_heart_rate_variability",
            MetricType::Steps => "read_steps",
            MetricType::Distance => "read_distance",
            MetricType::ActiveCalories => "read_active_calories",
            MetricType::TotalCalories => "read_total_calories",
            MetricType::Hydration => "read_hydration",
            MetricType::FloorsClimbed => "read_floors_climbed",
            MetricType::HeartRateSeries => "read_heart_rate",
            MetricType::SpeedSeries => "read_speed",
            MetricType::PowerSeries => "read_power",
            MetricType::CadenceSeries => "read_cadence",
            MetricType::SleepSession => "read_sleep",
            MetricType::ExerciseSession => "read_exercise",
        }
    }

    /// Store table holding committed records of this type
    pub fn table(&self) -> &'static str {
        match self {
            MetricType::Weight => "weight_records",
            MetricType::Height => "height_records",
            MetricType::BodyFat => "body_fat_records",
            MetricType::BodyTemperature => "body_temperature_records",
            MetricType::RestingHeartRate => "resting_heart_rate_records",
            MetricType::BloodGlucose => "blood_glucose_records",
            MetricType::BloodPressure => "blood_pressure_records",
            MetricType::OxygenSaturation => "oxygen_saturation_records",
            MetricType::Vo2Max => "vo2_max_records",
            MetricType::HeartRateVariability => "heart_rate_variability_records",
            MetricType::Steps => "steps_records",
            MetricType::Distance => "distance_records",
            MetricType::ActiveCalories => "active_calories_records",
            MetricType::TotalCalories => "total_calories_records",
            MetricType::Hydration => "hydration_records",
            MetricType::FloorsClimbed => "floors_climbed_records",
            MetricType::HeartRateSeries => "heart_rate_series",
            MetricType::SpeedSeries => "speed_series",
            MetricType::PowerSeries => "power_series",
            MetricType::CadenceSeries => "cadence_series",
            MetricType::SleepSession => "sleep_sessions",
            MetricType::ExerciseSession => "exercise_sessions",
        }
    }

    /// Structural kind, selecting the processor strategy
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricType::Weight
            | MetricType::Height
            | MetricType::BodyFat
            | MetricType::BodyTemperature
            | MetricType::RestingHeartRate
            | MetricType::BloodGlucose
            | MetricType::BloodPressure
            | MetricType::OxygenSaturation
            | MetricType::Vo2Max
            | MetricType::HeartRateVariability
            | MetricType::Steps
            | MetricType::Distance
            | MetricType::ActiveCalories
            | MetricType::TotalCalories
            | MetricType::Hydration
            | MetricType::FloorsClimbed => MetricKind::Scalar,
            MetricType::HeartRateSeries
            | MetricType::SpeedSeries
            | MetricType::PowerSeries
            | MetricType::CadenceSeries => MetricKind::Series,
            MetricType::SleepSession | MetricType::ExerciseSession => MetricKind::Session,
        }
    }

    /// Whether records of this type cover an instant or an interval
    pub fn time_shape(&self) -> TimeShape {
        match self {
            MetricType::Weight
            | MetricType::Height
            | MetricType::BodyFat
            | MetricType::BodyTemperature
            | MetricType::RestingHeartRate
            | MetricType::BloodGlucose
            | MetricType::BloodPressure
            | MetricType::OxygenSaturation
            | MetricType::Vo2Max
            | MetricType::HeartRateVariability => TimeShape::Instant,
            _ => TimeShape::Interval,
        }
    }

    /// Child table for series samples or session intervals, if any
    pub fn child_table(&self) -> Option<String> {
        match self.kind() {
            MetricKind::Scalar => None,
            MetricKind::Series => Some(format!("{}_samples", self.table())),
            MetricKind::Session => Some(format!("{}_intervals", self.table())),
        }
    }

    /// Resolve a staging-file stem (`{TypeName}_{millis}`) back to its type
    ///
    /// Matching is on the exact `{TypeName}_` prefix, which is what makes the
    /// staging filename load-bearing for commit dispatch.
    pub fn from_prefix(file_stem: &str) -> Option<MetricType> {
        MetricType::ALL
            .iter()
            .copied()
            .find(|t| {
                file_stem
                    .strip_prefix(t.name())
                    .map(|rest| rest.starts_with('_'))
                    .unwrap_or(false)
            })
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MetricType {
    type Err = crate::error::PulseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MetricType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| crate::error::PulseError::UnknownMetricType(s.to_string()))
    }
}
