//! Per-type payload mappings
//!
//! One small function per metric type, turning the wire envelope's
//! type-specific `fields` (and nested samples or sub-records) into the typed
//! canonical payload. Registered through [`payload_mapper`], which is the
//! single place that pairs a registry entry with its mapping.

use pulse_common::record::{ExerciseSegment, MetricPayload, Sample, SleepStage};
use pulse_common::registry::MetricType;

use super::PayloadMapper;
use crate::error::FetchError;
use crate::provider::ExternalRecord;

/// Mapping for one registry entry
pub fn payload_mapper(metric_type: MetricType) -> PayloadMapper {
    match metric_type {
        MetricType::Weight => weight,
        MetricType::Height => height,
        MetricType::BodyFat => body_fat,
        MetricType::BodyTemperature => body_temperature,
        MetricType::RestingHeartRate => resting_heart_rate,
        MetricType::BloodGlucose => blood_glucose,
        MetricType::BloodPressure => blood_pressure,
        MetricType::OxygenSaturation => oxygen_saturation,
        MetricType::Vo2Max => vo2_max,
        MetricType::HeartRateVariability => heart_rate_variability,
        MetricType::Steps => steps,
        MetricType::Distance => distance,
        MetricType::ActiveCalories => active_calories,
        MetricType::TotalCalories => total_calories,
        MetricType::Hydration => hydration,
        MetricType::FloorsClimbed => floors_climbed,
        MetricType::HeartRateSeries => heart_rate_series,
        MetricType::SpeedSeries => speed_series,
        MetricType::PowerSeries => power_series,
        MetricType::CadenceSeries => cadence_series,
        MetricType::SleepSession => sleep_session,
        MetricType::ExerciseSession => exercise_session,
    }
}

fn samples_of(record: &ExternalRecord) -> Vec<Sample> {
    record
        .samples
        .iter()
        .map(|s| Sample {
            at: s.time,
            value: s.value,
        })
        .collect()
}

fn weight(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::Weight {
        kilograms: record.num_field("kilograms")?,
    })
}

fn height(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::Height {
        meters: record.num_field("meters")?,
    })
}

fn body_fat(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::BodyFat {
        percentage: record.num_field("percentage")?,
    })
}

fn body_temperature(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::BodyTemperature {
        celsius: record.num_field("celsius")?,
    })
}

fn resting_heart_rate(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::RestingHeartRate {
        beats_per_minute: record.int_field("beatsPerMinute")?,
    })
}

fn blood_glucose(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::BloodGlucose {
        millimoles_per_liter: record.num_field("millimolesPerLiter")?,
        relation_to_meal: record.str_field_opt("relationToMeal"),
    })
}

fn blood_pressure(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::BloodPressure {
        systolic_mmhg: record.num_field("systolic")?,
        diastolic_mmhg: record.num_field("diastolic")?,
    })
}

fn oxygen_saturation(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::OxygenSaturation {
        percentage: record.num_field("percentage")?,
    })
}

fn vo2_max(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::Vo2Max {
        ml_per_minute_per_kg: record.num_field("mlPerMinutePerKg")?,
    })
}

fn heart_rate_variability(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::HeartRateVariability {
        rmssd_millis: record.num_field("rmssdMillis")?,
    })
}

fn steps(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::Steps {
        count: record.int_field("count")?,
    })
}

fn distance(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::Distance {
        meters: record.num_field("meters")?,
    })
}

fn active_calories(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::ActiveCalories {
        kilocalories: record.num_field("kilocalories")?,
    })
}

fn total_calories(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::TotalCalories {
        kilocalories: record.num_field("kilocalories")?,
    })
}

fn hydration(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::Hydration {
        liters: record.num_field("liters")?,
    })
}

fn floors_climbed(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::FloorsClimbed {
        floors: record.num_field("floors")?,
    })
}

fn heart_rate_series(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::HeartRateSeries {
        samples: samples_of(record),
    })
}

fn speed_series(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::SpeedSeries {
        samples: samples_of(record),
    })
}

fn power_series(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::PowerSeries {
        samples: samples_of(record),
    })
}

fn cadence_series(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::CadenceSeries {
        samples: samples_of(record),
    })
}

fn sleep_session(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::SleepSession {
        title: record.str_field_opt("title"),
        notes: record.str_field_opt("notes"),
        stages: record
            .stages
            .iter()
            .map(|s| SleepStage {
                start: s.start_time,
                end: s.end_time,
                stage: s.stage.clone(),
            })
            .collect(),
    })
}

fn exercise_session(record: &ExternalRecord) -> Result<MetricPayload, FetchError> {
    Ok(MetricPayload::ExerciseSession {
        exercise_type: record.str_field("exerciseType")?,
        title: record.str_field_opt("title"),
        segments: record
            .segments
            .iter()
            .map(|s| ExerciseSegment {
                start: s.start_time,
                end: s.end_time,
                segment_type: s.segment_type.clone(),
                repetitions: s.repetitions,
            })
            .collect(),
    })
}
