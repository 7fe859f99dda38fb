//! End-to-end pipeline tests
//!
//! Drive the full path against a mock provider: fetch -> staging file ->
//! commit -> store, with permission gating, the commit trigger, and
//! idempotent re-runs.

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pulse_common::registry::MetricType;
use pulse_ingest::config::ProviderConfig;
use pulse_ingest::fetch::FetcherFactory;
use pulse_ingest::orchestrator::{CommitOrchestrator, FetchOrchestrator};
use pulse_ingest::processor::ProcessorFactory;
use pulse_ingest::provider::ProviderClient;
use pulse_ingest::trigger::{commit_trigger, CommitSignal};
use pulse_ingest::StagingArea;
use pulse_store::{ScalarStore, SeriesStore, SessionStore};

struct Pipeline {
    pool: sqlx::SqlitePool,
    staging: Arc<StagingArea>,
    fetch: FetchOrchestrator,
    commit: CommitOrchestrator,
    signal: CommitSignal,
    _dir: tempfile::TempDir,
}

async fn pipeline(server: &MockServer) -> Pipeline {
    let pool = pulse_store::memory().await.unwrap();
    pulse_store::schema::init(&pool).await.unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let staging = Arc::new(
        StagingArea::new(dir.path().join("staging"), dir.path().join("completed")).unwrap(),
    );

    let client = Arc::new(
        ProviderClient::new(&ProviderConfig {
            base_url: server.uri(),
            api_token: Some("test-token".to_string()),
            request_timeout_secs: 5,
        })
        .unwrap(),
    );

    let (trigger, signal) = commit_trigger();
    let fetch = FetchOrchestrator::new(
        client.clone(),
        FetcherFactory::new(client).unwrap(),
        staging.clone(),
        60,
        trigger,
    );
    let commit = CommitOrchestrator::new(
        ProcessorFactory::new(pool.clone(), 100).unwrap(),
        staging.clone(),
    );

    Pipeline {
        pool,
        staging,
        fetch,
        commit,
        signal,
        _dir: dir,
    }
}

async fn mount_permissions(server: &MockServer, types: &[MetricType]) {
    let permissions: Vec<&str> = types.iter().map(|t| t.permission()).collect();
    Mock::given(method("GET"))
        .and(path("/v1/permissions/granted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(permissions)))
        .mount(server)
        .await;
}

async fn mount_records(server: &MockServer, metric_type: MetricType, records: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/records/{}", metric_type.name())))
        .respond_with(ResponseTemplate::new(200).set_body_json(records))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_then_commit_lands_in_store() {
    let server = MockServer::start().await;
    mount_permissions(
        &server,
        &[
            MetricType::Weight,
            MetricType::Steps,
            MetricType::HeartRateSeries,
            MetricType::SleepSession,
        ],
    )
    .await;
    mount_records(
        &server,
        MetricType::Weight,
        json!([{
            "id": "w-1",
            "startTime": "2026-01-02T08:30:00Z",
            "zoneOffset": "+01:00",
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T08:31:00Z",
            "device": { "manufacturer": "Acme", "model": "Scale 2", "type": "scale" },
            "fields": { "kilograms": 81.5 }
        }]),
    )
    .await;
    mount_records(
        &server,
        MetricType::Steps,
        json!([{
            "id": "s-1",
            "startTime": "2026-01-02T08:00:00Z",
            "endTime": "2026-01-02T08:30:00Z",
            "zoneOffset": null,
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T08:30:00Z",
            "fields": { "count": 1200 }
        }]),
    )
    .await;
    mount_records(
        &server,
        MetricType::HeartRateSeries,
        json!([{
            "id": "hr-1",
            "startTime": "2026-01-02T08:00:00Z",
            "endTime": "2026-01-02T08:05:00Z",
            "zoneOffset": null,
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T08:05:00Z",
            "fields": {},
            "samples": [
                { "time": "2026-01-02T08:00:00Z", "value": 61.0 },
                { "time": "2026-01-02T08:01:00Z", "value": 64.0 },
                { "time": "2026-01-02T08:02:00Z", "value": 66.0 }
            ]
        }]),
    )
    .await;
    mount_records(
        &server,
        MetricType::SleepSession,
        json!([{
            "id": "sleep-1",
            "startTime": "2026-01-01T22:00:00Z",
            "endTime": "2026-01-02T06:00:00Z",
            "zoneOffset": "+01:00",
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T06:01:00Z",
            "fields": { "title": "Night" },
            "stages": [
                { "startTime": "2026-01-01T22:00:00Z", "endTime": "2026-01-02T00:00:00Z", "stage": "light" },
                { "startTime": "2026-01-02T00:00:00Z", "endTime": "2026-01-02T03:00:00Z", "stage": "deep" }
            ]
        }]),
    )
    .await;

    let mut p = pipeline(&server).await;
    let run_at = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();

    let fetch_report = p.fetch.run_at(run_at).await;
    assert!(fetch_report.is_success());
    assert_eq!(fetch_report.files_written.len(), 4);
    // staging fired the trigger
    assert_eq!(p.signal.fired().await, Some(()));

    let commit_report = p.commit.run().await;
    assert!(commit_report.is_success());
    assert_eq!(commit_report.records_committed(), 4);

    // staging drained, files relocated
    assert!(p.staging.list_staged().unwrap().is_empty());

    let weights = ScalarStore::new(p.pool.clone(), MetricType::Weight);
    let weight = weights
        .get_by_natural_key("w-1")
        .await
        .unwrap()
        .expect("weight committed");
    assert_eq!(weight.value, 81.5);
    assert_eq!(weight.zone_offset.as_deref(), Some("+01:00"));
    assert_eq!(weight.device_manufacturer.as_deref(), Some("Acme"));

    let steps = ScalarStore::new(p.pool.clone(), MetricType::Steps);
    let step_row = steps
        .get_by_natural_key("s-1")
        .await
        .unwrap()
        .expect("steps committed");
    assert_eq!(step_row.value, 1200.0);
    assert_eq!(
        step_row.end_time,
        Some(Utc.with_ymd_and_hms(2026, 1, 2, 8, 30, 0).unwrap())
    );

    let series = SeriesStore::new(p.pool.clone(), MetricType::HeartRateSeries);
    let samples = series.samples_for("hr-1").await.unwrap();
    assert_eq!(samples.len(), 3);
    assert_eq!(samples[2].value, 66.0);

    let sessions = SessionStore::new(p.pool.clone(), MetricType::SleepSession);
    let session = sessions
        .get_by_natural_key("sleep-1")
        .await
        .unwrap()
        .expect("session committed");
    assert_eq!(session.title.as_deref(), Some("Night"));
    let stages = sessions.children_for("sleep-1").await.unwrap();
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].kind, "light");
}

#[tokio::test]
async fn test_overlapping_windows_commit_idempotently() {
    let server = MockServer::start().await;
    mount_permissions(&server, &[MetricType::Steps]).await;
    mount_records(
        &server,
        MetricType::Steps,
        json!([{
            "id": "s-1",
            "startTime": "2026-01-02T08:00:00Z",
            "endTime": "2026-01-02T08:30:00Z",
            "zoneOffset": null,
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T08:30:00Z",
            "fields": { "count": 1200 }
        }]),
    )
    .await;

    let p = pipeline(&server).await;

    // two overlapping fetch windows return the same record
    let first = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2026, 1, 2, 9, 15, 0).unwrap();
    assert!(p.fetch.run_at(first).await.is_success());
    assert!(p.fetch.run_at(second).await.is_success());
    assert_eq!(p.staging.staged_for(MetricType::Steps).unwrap().len(), 2);

    let report = p.commit.run().await;
    assert!(report.is_success());

    let store = ScalarStore::new(p.pool.clone(), MetricType::Steps);
    assert_eq!(store.count().await.unwrap(), 1);
    let row = store.get_by_natural_key("s-1").await.unwrap().unwrap();
    assert_eq!(row.value, 1200.0);
}

#[tokio::test]
async fn test_denied_permission_fetches_nothing_for_that_type() {
    let server = MockServer::start().await;
    mount_permissions(&server, &[MetricType::Weight]).await;
    mount_records(
        &server,
        MetricType::Weight,
        json!([{
            "id": "w-1",
            "startTime": "2026-01-02T08:30:00Z",
            "zoneOffset": null,
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T08:31:00Z",
            "fields": { "kilograms": 80.0 }
        }]),
    )
    .await;
    // no /v1/records/Steps mock: a request there would 404 and fail the run

    let p = pipeline(&server).await;
    let report = p
        .fetch
        .run_at(Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap())
        .await;

    assert!(report.is_success());
    assert!(report.skipped.contains(&MetricType::Steps));
    assert_eq!(report.files_written.len(), 1);
}

#[tokio::test]
async fn test_failed_commit_retries_on_next_run() {
    let server = MockServer::start().await;
    mount_permissions(&server, &[MetricType::SleepSession]).await;
    // the stage violates end > start and rolls the record back
    mount_records(
        &server,
        MetricType::SleepSession,
        json!([{
            "id": "sleep-bad",
            "startTime": "2026-01-01T22:00:00Z",
            "endTime": "2026-01-02T06:00:00Z",
            "zoneOffset": null,
            "originId": "com.example.tracker",
            "lastModifiedAt": "2026-01-02T06:01:00Z",
            "fields": {},
            "stages": [
                { "startTime": "2026-01-01T22:00:00Z", "endTime": "2026-01-01T22:00:00Z", "stage": "light" }
            ]
        }]),
    )
    .await;

    let p = pipeline(&server).await;
    let fetch_report = p
        .fetch
        .run_at(Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap())
        .await;
    assert!(fetch_report.is_success());

    let report = p.commit.run().await;
    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);

    // file survives for the next run; nothing landed in the store
    assert_eq!(
        p.staging.staged_for(MetricType::SleepSession).unwrap().len(),
        1
    );
    let sessions = SessionStore::new(p.pool.clone(), MetricType::SleepSession);
    assert_eq!(sessions.count().await.unwrap(), 0);

    // the next commit run sees the same file again
    let retry = p.commit.run().await;
    assert_eq!(retry.failed.len(), 1);
}
