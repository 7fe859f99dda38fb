//! Durable staging files
//!
//! A staging file is one type-homogeneous batch of canonical records,
//! serialized as a single JSON container named `{TypeName}_{epoch_millis}.json`.
//! The file's presence in the staging directory is the sole marker of
//! "fetched, not yet committed"; relocation into the completed directory is
//! the hand-off checkpoint.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a reader never observes a half-written file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use pulse_common::record::CanonicalRecord;
use pulse_common::registry::MetricType;

use crate::error::StagingError;

/// Staging file extension
pub const STAGING_EXT: &str = "json";

/// Contents of one staging file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingBatch {
    pub metric_type: MetricType,
    pub created_at: DateTime<Utc>,
    pub records: Vec<CanonicalRecord>,
}

/// Borrowed view used for serialization, so writing does not clone records
#[derive(Serialize)]
struct StagingBatchRef<'a> {
    metric_type: MetricType,
    created_at: DateTime<Utc>,
    records: &'a [CanonicalRecord],
}

/// The staging and completed directories
#[derive(Debug, Clone)]
pub struct StagingArea {
    staging_dir: PathBuf,
    completed_dir: PathBuf,
}

impl StagingArea {
    /// Open (and create if needed) the staging and completed directories
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        completed_dir: impl Into<PathBuf>,
    ) -> Result<Self, StagingError> {
        let staging_dir = staging_dir.into();
        let completed_dir = completed_dir.into();
        fs::create_dir_all(&staging_dir)?;
        fs::create_dir_all(&completed_dir)?;
        Ok(Self {
            staging_dir,
            completed_dir,
        })
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn completed_dir(&self) -> &Path {
        &self.completed_dir
    }

    /// Deterministic staging file name for one type and run timestamp
    pub fn file_name(metric_type: MetricType, created_at: DateTime<Utc>) -> String {
        format!(
            "{}_{}.{}",
            metric_type.name(),
            created_at.timestamp_millis(),
            STAGING_EXT
        )
    }

    /// Serialize one batch into the staging directory
    ///
    /// An empty record list is a no-op reporting success without a file.
    pub fn write_batch(
        &self,
        metric_type: MetricType,
        created_at: DateTime<Utc>,
        records: &[CanonicalRecord],
    ) -> Result<Option<PathBuf>, StagingError> {
        if records.is_empty() {
            return Ok(None);
        }

        let batch = StagingBatchRef {
            metric_type,
            created_at,
            records,
        };

        let mut tmp = NamedTempFile::new_in(&self.staging_dir)?;
        serde_json::to_writer(&mut tmp, &batch).map_err(StagingError::Encode)?;
        tmp.flush()?;

        let path = self.staging_dir.join(Self::file_name(metric_type, created_at));
        tmp.persist(&path).map_err(|e| StagingError::Io(e.error))?;

        debug!(
            metric_type = %metric_type,
            records = records.len(),
            path = %path.display(),
            "staging file written"
        );
        Ok(Some(path))
    }

    /// Decode one staging file
    ///
    /// Failures are per file: a corrupt file or a record whose payload
    /// disagrees with the batch type rejects the whole file.
    pub fn read_batch(path: &Path) -> Result<StagingBatch, StagingError> {
        let file = fs::File::open(path)?;
        let batch: StagingBatch =
            serde_json::from_reader(BufReader::new(file)).map_err(StagingError::Decode)?;

        for record in &batch.records {
            if record.metric_type() != batch.metric_type {
                return Err(StagingError::TypeMismatch {
                    expected: batch.metric_type,
                    found: record.metric_type(),
                });
            }
        }

        Ok(batch)
    }

    /// Every staging file currently awaiting commit
    pub fn list_staged(&self) -> Result<Vec<PathBuf>, StagingError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.staging_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(STAGING_EXT) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Metric type encoded in a staging file name, if recognized
    pub fn type_of(path: &Path) -> Option<MetricType> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(MetricType::from_prefix)
    }

    /// Staged files for one type, oldest first by embedded timestamp
    pub fn staged_for(&self, metric_type: MetricType) -> Result<Vec<PathBuf>, StagingError> {
        let mut files: Vec<PathBuf> = self
            .list_staged()?
            .into_iter()
            .filter(|p| Self::type_of(p) == Some(metric_type))
            .collect();
        files.sort_by_key(|p| embedded_millis(p).unwrap_or(i64::MAX));
        Ok(files)
    }

    /// Relocate a successfully processed file into the completed directory
    pub fn complete(&self, path: &Path) -> Result<PathBuf, StagingError> {
        let name = path
            .file_name()
            .ok_or_else(|| StagingError::BadFileName(path.to_path_buf()))?;
        let target = self.completed_dir.join(name);
        fs::rename(path, &target)?;
        Ok(target)
    }
}

/// Timestamp embedded in a `{TypeName}_{millis}.json` file name
fn embedded_millis(path: &Path) -> Option<i64> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.rsplit('_').next())
        .and_then(|millis| millis.parse().ok())
}
