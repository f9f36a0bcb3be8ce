//! Retraining service client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::eval::drift::Severity;
use crate::storage::CallStatus;

/// Reason sent with automatic triggers
pub const DRIFT_REASON: &str = "data_drift_detected";

/// Body of `POST /retrain/{entity_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrainRequest {
    pub entity_id: String,
    pub reason: String,
    pub drift_severity: Severity,
    pub drift_features: Vec<String>,
    pub triggered_at: DateTime<Utc>,
    pub triggered_by: String,
}

/// Accepted retraining job.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrainResponse {
    /// `job_id` or `id` from the response body, `"unknown"` if neither is present
    pub job_id: String,
    pub body: serde_json::Value,
}

/// Retraining call failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrainError {
    #[error("retraining API not configured (set retraining.base_url or ML_API_BASE_URL)")]
    NotConfigured,

    #[error("retraining API timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("retraining API unreachable: {0}")]
    Connect(String),

    #[error("retraining API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("retraining API request failed: {0}")]
    Request(String),

    #[error("retraining API response invalid: {0}")]
    InvalidResponse(String),
}

impl RetrainError {
    /// Worth retrying at the transport layer
    pub fn is_transient(&self) -> bool {
        match self {
            RetrainError::Timeout { .. } | RetrainError::Connect(_) => true,
            RetrainError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the call reached the service and should count against the breaker
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, RetrainError::NotConfigured)
    }

    /// How the failed call is recorded in the job log
    pub fn call_status(&self) -> CallStatus {
        match self {
            RetrainError::Timeout { .. } => CallStatus::Timeout,
            _ => CallStatus::Failed,
        }
    }
}

/// Anything that can start a retraining job.
pub trait RetrainClient: Send + Sync {
    fn trigger(&self, request: &RetrainRequest) -> Result<RetrainResponse, RetrainError>;

    /// `false` when every call would fail with [`RetrainError::NotConfigured`]
    fn is_configured(&self) -> bool {
        true
    }
}

/// Exponential backoff for transient failures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, backoff: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// `backoff * 2^attempt`, attempt counted from 0
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Extract the job identifier from a retraining API response.
pub fn job_id_from(body: &serde_json::Value) -> String {
    ["job_id", "id"]
        .iter()
        .filter_map(|key| body.get(key))
        .find_map(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Blocking HTTP client for the retraining service.
pub struct HttpRetrainClient {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
    client: reqwest::blocking::Client,
}

impl HttpRetrainClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, RetrainError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("vigilar/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RetrainError::Request(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        if base_url.is_none() {
            warn!("retraining API base URL not configured, retraining triggers disabled");
        }

        Ok(Self { base_url, api_key, timeout, retry, client })
    }

    fn endpoint(&self, base: &str, entity_id: &str) -> String {
        format!("{base}/retrain/{entity_id}")
    }

    fn attempt(
        &self,
        url: &str,
        request: &RetrainRequest,
    ) -> Result<RetrainResponse, RetrainError> {
        let mut req = self.client.post(url).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RetrainError::Http { status: status.as_u16(), body });
        }

        let body: serde_json::Value =
            response.json().map_err(|e| RetrainError::InvalidResponse(e.to_string()))?;
        Ok(RetrainResponse { job_id: job_id_from(&body), body })
    }

    fn classify(&self, e: reqwest::Error) -> RetrainError {
        if e.is_timeout() {
            RetrainError::Timeout { seconds: self.timeout.as_secs() }
        } else if e.is_connect() {
            RetrainError::Connect(e.to_string())
        } else {
            RetrainError::Request(e.to_string())
        }
    }
}

impl RetrainClient for HttpRetrainClient {
    fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn trigger(&self, request: &RetrainRequest) -> Result<RetrainResponse, RetrainError> {
        let base = self.base_url.as_deref().ok_or(RetrainError::NotConfigured)?;
        let url = self.endpoint(base, &request.entity_id);
        info!(entity = %request.entity_id, url = %url, "triggering retraining");

        let mut attempt = 0;
        loop {
            match self.attempt(&url, request) {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        entity = %request.entity_id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retraining call failed, retrying"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
