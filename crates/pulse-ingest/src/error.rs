//! Ingest-specific error types
//!
//! The taxonomy mirrors the pipeline's isolation boundaries: a
//! [`FetchError`] is scoped to one type's fetch, a [`StagingError`] to one
//! staging file, a [`CommitError`] to one file's commit. Orchestrators
//! capture these at the smallest unit and roll them up into run reports;
//! configuration errors surface as `pulse_common::PulseError::Config` and
//! abort startup.

use std::path::PathBuf;

use pulse_common::registry::MetricType;
use thiserror::Error;

/// Failure fetching one type's records from the provider
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status} for {url}")]
    Http { status: u16, url: String },

    #[error("malformed provider response: {0}")]
    Body(#[from] serde_json::Error),

    #[error("record {natural_key} is missing field {field}")]
    MissingField {
        natural_key: String,
        field: &'static str,
    },

    #[error("no fetcher registered for {0}")]
    Unregistered(MetricType),

    #[error(transparent)]
    Staging(#[from] StagingError),
}

/// Failure writing or reading one staging file
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("staging IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode staging batch: {0}")]
    Encode(serde_json::Error),

    #[error("failed to decode staging file: {0}")]
    Decode(serde_json::Error),

    #[error("staging file name does not match any metric type: {0}")]
    BadFileName(PathBuf),

    #[error("staging file for {expected} contains a {found} record")]
    TypeMismatch {
        expected: MetricType,
        found: MetricType,
    },
}

/// Failure committing one staging file into the store
#[derive(Error, Debug)]
pub enum CommitError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("store write failed: {0}")]
    Store(#[from] sqlx::Error),

    #[error("record {natural_key} cannot be committed: {reason}")]
    Decode { natural_key: String, reason: String },
}
