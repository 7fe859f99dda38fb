//! External provider client
//!
//! The provider exposes a permissioned, time-windowed read API over HTTP:
//!
//! - `GET /v1/permissions/granted` returns the permission ids granted to
//!   this client
//! - `GET /v1/records/{TypeName}?start=..&end=..` returns records of one
//!   type whose coverage intersects the half-open window (RFC 3339 bounds)
//!
//! Responses are strongly typed JSON. Requests carry a caller-imposed
//! timeout and, when configured, a bearer token.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use pulse_common::registry::MetricType;
use pulse_common::time::TimeWindow;

use crate::config::ProviderConfig;
use crate::error::FetchError;

/// HTTP client for the external metric provider
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    /// Permission ids granted to this client
    pub async fn granted_permissions(&self) -> Result<HashSet<String>, FetchError> {
        let url = format!("{}/v1/permissions/granted", self.base_url);
        let body = self.get(&url, &[]).await?;
        let permissions: Vec<String> = serde_json::from_slice(&body)?;
        Ok(permissions.into_iter().collect())
    }

    /// Records of one type intersecting the window
    pub async fn read_records(
        &self,
        metric_type: MetricType,
        window: &TimeWindow,
    ) -> Result<Vec<ExternalRecord>, FetchError> {
        let url = format!("{}/v1/records/{}", self.base_url, metric_type.name());
        let query = [
            ("start".to_string(), window.start.to_rfc3339()),
            ("end".to_string(), window.end.to_rfc3339()),
        ];
        let body = self.get(&url, &query).await?;
        let records: Vec<ExternalRecord> = serde_json::from_slice(&body)?;
        Ok(records)
    }

    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, FetchError> {
        let mut request = self.http.get(url).query(query);
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Device descriptor on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDevice {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// One sample inside a series record on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// One sleep stage interval on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalStage {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub stage: String,
}

/// One exercise segment on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSegment {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub segment_type: String,
    #[serde(default)]
    pub repetitions: Option<i64>,
}

/// Wire envelope for one external record
///
/// Type-specific values live in the free-form `fields` object; nested
/// structures arrive in `samples`, `stages`, or `segments` depending on the
/// type. The payload mappers pull out what each type needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRecord {
    /// Provider-assigned unique id; becomes the natural key
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub zone_offset: Option<String>,
    pub origin_id: String,
    pub last_modified_at: DateTime<Utc>,
    #[serde(default)]
    pub client_record_id: Option<String>,
    #[serde(default)]
    pub client_record_version: i64,
    #[serde(default)]
    pub device: Option<ExternalDevice>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub samples: Vec<ExternalSample>,
    #[serde(default)]
    pub stages: Vec<ExternalStage>,
    #[serde(default)]
    pub segments: Vec<ExternalSegment>,
}

impl ExternalRecord {
    /// Required numeric field from the type-specific `fields` object
    pub fn num_field(&self, field: &'static str) -> Result<f64, FetchError> {
        self.fields
            .get(field)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| FetchError::MissingField {
                natural_key: self.id.clone(),
                field,
            })
    }

    /// Required integer field from the type-specific `fields` object
    pub fn int_field(&self, field: &'static str) -> Result<i64, FetchError> {
        self.fields
            .get(field)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| FetchError::MissingField {
                natural_key: self.id.clone(),
                field,
            })
    }

    /// Required string field from the type-specific `fields` object
    pub fn str_field(&self, field: &'static str) -> Result<String, FetchError> {
        self.fields
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| FetchError::MissingField {
                natural_key: self.id.clone(),
                field,
            })
    }

    /// Optional string field from the type-specific `fields` object
    pub fn str_field_opt(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}
