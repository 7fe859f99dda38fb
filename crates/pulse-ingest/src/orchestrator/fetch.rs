//! One fetch pass over the metric-type registry

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pulse_common::registry::MetricType;
use pulse_common::time::TimeWindow;

use crate::error::FetchError;
use crate::fetch::FetcherFactory;
use crate::provider::ProviderClient;
use crate::staging::StagingArea;
use crate::trigger::CommitTrigger;

/// Outcome of one fetch run
#[derive(Debug)]
pub struct FetchRunReport {
    pub run_at: DateTime<Utc>,
    /// Staging files written, one per type that had records
    pub files_written: Vec<PathBuf>,
    /// Types skipped because their read permission is not granted
    pub skipped: Vec<MetricType>,
    /// Types whose fetch or staging write failed
    pub failures: Vec<(MetricType, String)>,
}

impl FetchRunReport {
    /// A run with any per-type failure is a failed run
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs one permission-gated fetch pass over every registry type
pub struct FetchOrchestrator {
    provider: Arc<ProviderClient>,
    fetchers: FetcherFactory,
    staging: Arc<StagingArea>,
    lookback_minutes: i64,
    trigger: CommitTrigger,
}

impl FetchOrchestrator {
    pub fn new(
        provider: Arc<ProviderClient>,
        fetchers: FetcherFactory,
        staging: Arc<StagingArea>,
        lookback_minutes: i64,
        trigger: CommitTrigger,
    ) -> Self {
        Self {
            provider,
            fetchers,
            staging,
            lookback_minutes,
            trigger,
        }
    }

    /// Fetch and stage every permitted type for the lookback window ending now
    pub async fn run(&self) -> FetchRunReport {
        self.run_at(Utc::now()).await
    }

    /// Fetch and stage for the lookback window ending at `run_at`
    pub async fn run_at(&self, run_at: DateTime<Utc>) -> FetchRunReport {
        let run_id = Uuid::new_v4();
        let window = TimeWindow::lookback(run_at, self.lookback_minutes);
        info!(%run_id, start = %window.start, end = %window.end, "fetch run starting");

        let mut report = FetchRunReport {
            run_at,
            files_written: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        };

        // one permission round-trip per run, not per type
        let granted = match self.provider.granted_permissions().await {
            Ok(granted) => granted,
            Err(err) => {
                error!(%run_id, error = %err, "permission check failed, aborting run");
                report
                    .failures
                    .extend(MetricType::ALL.iter().map(|t| (*t, err.to_string())));
                return report;
            },
        };

        for metric_type in MetricType::ALL {
            if !granted.contains(metric_type.permission()) {
                debug!(%run_id, %metric_type, "permission not granted, skipping");
                report.skipped.push(*metric_type);
                continue;
            }

            match self.fetch_one(*metric_type, &window, run_at).await {
                Ok(Some(path)) => {
                    info!(%run_id, %metric_type, file = %path.display(), "staged");
                    report.files_written.push(path);
                },
                Ok(None) => {
                    debug!(%run_id, %metric_type, "no records in window");
                },
                Err(err) => {
                    warn!(%run_id, %metric_type, error = %err, "type failed, continuing");
                    report.failures.push((*metric_type, err.to_string()));
                },
            }
        }

        info!(
            %run_id,
            files = report.files_written.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "fetch run finished"
        );

        if !report.files_written.is_empty() {
            self.trigger.fire();
        }

        report
    }

    async fn fetch_one(
        &self,
        metric_type: MetricType,
        window: &TimeWindow,
        run_at: DateTime<Utc>,
    ) -> Result<Option<PathBuf>, FetchError> {
        let fetcher = self
            .fetchers
            .resolve(metric_type)
            .ok_or(FetchError::Unregistered(metric_type))?;

        let records = fetcher.fetch_and_map(window).await?;
        Ok(self.staging.write_batch(metric_type, run_at, &records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::trigger::commit_trigger;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record_json(id: &str, start: &str) -> serde_json::Value {
        json!({
            "id": id,
            "startTime": start,
            "zoneOffset": null,
            "originId": "com.example.tracker",
            "lastModifiedAt": start,
            "fields": { "kilograms": 81.5 }
        })
    }

    async fn orchestrator(
        server: &MockServer,
        dir: &TempDir,
    ) -> (FetchOrchestrator, crate::trigger::CommitSignal) {
        let client = Arc::new(
            ProviderClient::new(&ProviderConfig {
                base_url: server.uri(),
                api_token: Some("test-token".to_string()),
                request_timeout_secs: 5,
            })
            .unwrap(),
        );
        let fetchers = FetcherFactory::new(client.clone()).unwrap();
        let staging = Arc::new(
            StagingArea::new(dir.path().join("staging"), dir.path().join("completed"))
                .unwrap(),
        );
        let (trigger, signal) = commit_trigger();
        (
            FetchOrchestrator::new(client, fetchers, staging, 60, trigger),
            signal,
        )
    }

    #[tokio::test]
    async fn test_denied_types_are_skipped_not_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/permissions/granted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["read_weight"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/records/Weight"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                record_json("w-1", "2026-01-02T08:30:00Z")
            ])))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (orch, mut signal) = orchestrator(&server, &dir).await;
        let run_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let report = orch.run_at(run_at).await;

        assert!(report.is_success());
        assert_eq!(report.files_written.len(), 1);
        assert_eq!(report.skipped.len(), MetricType::ALL.len() - 1);
        // staging something fires the commit trigger
        assert_eq!(signal.fired().await, Some(()));
    }

    #[tokio::test]
    async fn test_one_failing_type_does_not_stop_the_rest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/permissions/granted"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(["read_weight", "read_steps"])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/records/Weight"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/records/Steps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "s-1",
                "startTime": "2026-01-02T08:00:00Z",
                "endTime": "2026-01-02T08:30:00Z",
                "zoneOffset": null,
                "originId": "com.example.tracker",
                "lastModifiedAt": "2026-01-02T08:30:00Z",
                "fields": { "count": 1200 }
            }])))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (orch, _signal) = orchestrator(&server, &dir).await;
        let run_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let report = orch.run_at(run_at).await;

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, MetricType::Weight);
        assert_eq!(report.files_written.len(), 1);
        assert!(report.files_written[0]
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .starts_with("Steps_"));
    }

    #[tokio::test]
    async fn test_empty_window_stages_nothing_and_stays_quiet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/permissions/granted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["read_weight"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/records/Weight"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (orch, mut signal) = orchestrator(&server, &dir).await;
        let report = orch.run_at(Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap()).await;

        assert!(report.is_success());
        assert!(report.files_written.is_empty());
        // nothing staged, so no trigger: the channel must be closed to observe it
        drop(orch);
        assert_eq!(signal.fired().await, None);
    }
}
