//! Pipeline scheduler
//!
//! Drives the two orchestrators: a timer loop runs fetch passes at the
//! configured interval, and a listener loop runs a commit pass whenever the
//! trigger fires. The loops are independent tasks, so a slow commit never
//! delays the next fetch.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::orchestrator::{CommitOrchestrator, FetchOrchestrator};
use crate::trigger::CommitSignal;

/// Long-running fetch and commit loops
pub struct Scheduler {
    fetch: Arc<FetchOrchestrator>,
    commit: Arc<CommitOrchestrator>,
    fetch_interval_secs: u64,
}

impl Scheduler {
    pub fn new(
        fetch: Arc<FetchOrchestrator>,
        commit: Arc<CommitOrchestrator>,
        fetch_interval_secs: u64,
    ) -> Self {
        Self {
            fetch,
            commit,
            fetch_interval_secs,
        }
    }

    /// Spawn both loops; the handles run until the process exits
    pub fn start(self, signal: CommitSignal) -> (JoinHandle<()>, JoinHandle<()>) {
        info!(
            interval_secs = self.fetch_interval_secs,
            "scheduler starting"
        );

        let fetch = self.fetch;
        let interval = Duration::from_secs(self.fetch_interval_secs);
        let fetch_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = fetch.run().await;
                if !report.is_success() {
                    error!(failures = report.failures.len(), "fetch run had failures");
                }
            }
        });

        let commit = self.commit;
        let commit_handle = tokio::spawn(async move {
            let mut signal = signal;
            // drain anything already staged before the first trigger
            commit.run().await;
            while signal.fired().await.is_some() {
                let report = commit.run().await;
                if !report.is_success() {
                    error!(failed = report.failed.len(), "commit run had failures");
                }
            }
            info!("commit trigger closed, commit loop stopping");
        });

        (fetch_handle, commit_handle)
    }
}
