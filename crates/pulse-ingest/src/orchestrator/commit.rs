//! One commit pass over the staging area

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pulse_common::registry::MetricType;

use crate::processor::ProcessorFactory;
use crate::staging::StagingArea;

/// Outcome of one commit run
#[derive(Debug)]
pub struct CommitRunReport {
    /// Files committed and relocated, with record counts
    pub processed: Vec<(PathBuf, usize)>,
    /// Files that failed and stay in staging for retry
    pub failed: Vec<(PathBuf, String)>,
    /// Files whose name matches no registry type; left untouched
    pub unrecognized: Vec<PathBuf>,
}

impl CommitRunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn records_committed(&self) -> usize {
        self.processed.iter().map(|(_, n)| n).sum()
    }
}

/// Drains staged files into the store, oldest first per type
pub struct CommitOrchestrator {
    processors: ProcessorFactory,
    staging: Arc<StagingArea>,
}

impl CommitOrchestrator {
    pub fn new(processors: ProcessorFactory, staging: Arc<StagingArea>) -> Self {
        Self { processors, staging }
    }

    /// Commit every staged file, oldest first within each type; a failed
    /// file stays put for retry and never blocks the next file or type
    pub async fn run(&self) -> CommitRunReport {
        let run_id = Uuid::new_v4();
        let mut report = CommitRunReport {
            processed: Vec::new(),
            failed: Vec::new(),
            unrecognized: Vec::new(),
        };

        let staged = match self.staging.list_staged() {
            Ok(staged) => staged,
            Err(err) => {
                error!(%run_id, error = %err, "cannot list staging area, aborting run");
                return report;
            },
        };
        if staged.is_empty() {
            debug!(%run_id, "staging area empty");
            return report;
        }
        info!(%run_id, files = staged.len(), "commit run starting");

        for path in &staged {
            if StagingArea::type_of(path).is_none() {
                warn!(%run_id, file = %path.display(), "unrecognized staging file, leaving in place");
                report.unrecognized.push(path.clone());
            }
        }

        for metric_type in MetricType::ALL {
            let files = match self.staging.staged_for(*metric_type) {
                Ok(files) => files,
                Err(err) => {
                    error!(%run_id, %metric_type, error = %err, "cannot enumerate staged files");
                    continue;
                },
            };

            for path in files {
                match self.commit_one(*metric_type, &path).await {
                    Ok(records) => {
                        info!(%run_id, %metric_type, file = %path.display(), records, "committed");
                        report.processed.push((path, records));
                    },
                    Err(reason) => {
                        warn!(%run_id, %metric_type, file = %path.display(), error = %reason,
                              "commit failed, file stays staged");
                        report.failed.push((path, reason));
                    },
                }
            }
        }

        info!(
            %run_id,
            files = report.processed.len(),
            records = report.records_committed(),
            failed = report.failed.len(),
            "commit run finished"
        );
        report
    }

    async fn commit_one(
        &self,
        metric_type: MetricType,
        path: &std::path::Path,
    ) -> Result<usize, String> {
        let processor = self
            .processors
            .resolve(metric_type)
            .ok_or_else(|| format!("no processor registered for {metric_type}"))?;

        let stats = processor.process(path).await.map_err(|e| e.to_string())?;

        // relocation is the durable commit checkpoint
        self.staging.complete(path).map_err(|e| e.to_string())?;
        Ok(stats.records_committed)
    }
}
