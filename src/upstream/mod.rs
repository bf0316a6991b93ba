//! Uniform retrying fetch primitive with per-source status tracking.
//!
//! Every upstream call in a report run goes through `Upstream`, which
//! retries transport failures and non-2xx responses with exponential
//! backoff and records the outcome of each attempt in a status table.
//! One `Upstream` is created per run, so the table never leaks between
//! runs.

pub mod transport;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FetchConfig;
pub use transport::{FetchRequest, HttpResponse, HttpTransport, ReqwestTransport};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// Every attempt failed.
    #[error("{source_id} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        source_id: String,
        attempts: u32,
        last_error: String,
    },
    /// The payload arrived but does not have the expected shape.
    #[error("{source_id} returned an unexpected payload: {reason}")]
    Malformed { source_id: String, reason: String },
    /// An ordered chain of providers all failed.
    #[error("{}", .0.join(" | "))]
    AllProvidersFailed(Vec<String>),
}

// ---------------------------------------------------------------------------
// Status table
// ---------------------------------------------------------------------------

/// Latest outcome recorded for one upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub ok: bool,
    pub attempts: u32,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// source id → latest status.
pub type StatusTable = BTreeMap<String, SourceStatus>;

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retries: u32,
    /// Delay before the first retry; doubled for each later one.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            retries: cfg.retries,
            backoff_base: cfg.backoff_base(),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Sleep before retry number `attempt` (1-based attempt that just failed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

enum Expect {
    Json,
    Text,
}

enum Payload {
    Json(serde_json::Value),
    Text(String),
}

/// Run-scoped fetcher: shared transport, private status table.
pub struct Upstream {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    status: StatusTable,
}

impl Upstream {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            status: StatusTable::new(),
        }
    }

    /// Fetch and decode a JSON payload.
    pub async fn get_json(
        &mut self,
        source_id: &str,
        request: &FetchRequest,
    ) -> Result<serde_json::Value, FetchError> {
        match self.fetch(source_id, request, Expect::Json).await? {
            Payload::Json(v) => Ok(v),
            Payload::Text(t) => Ok(serde_json::Value::String(t)),
        }
    }

    /// Fetch a raw text payload (markup feeds).
    pub async fn get_text(
        &mut self,
        source_id: &str,
        request: &FetchRequest,
    ) -> Result<String, FetchError> {
        match self.fetch(source_id, request, Expect::Text).await? {
            Payload::Text(t) => Ok(t),
            Payload::Json(v) => Ok(v.to_string()),
        }
    }

    pub fn status(&self) -> &StatusTable {
        &self.status
    }

    /// Hand the table over once the run is finished.
    pub fn into_status(self) -> StatusTable {
        self.status
    }

    async fn fetch(
        &mut self,
        source_id: &str,
        request: &FetchRequest,
        expect: Expect,
    ) -> Result<Payload, FetchError> {
        let url = request.display_url();
        let total = self.policy.total_attempts();
        let mut last_error = String::new();

        for attempt in 1..=total {
            match self.attempt(request, &expect).await {
                Ok(payload) => {
                    self.record(source_id, true, attempt, &url, None);
                    debug!(source = source_id, attempt, "Upstream fetch ok");
                    return Ok(payload);
                }
                Err(e) => {
                    warn!(source = source_id, attempt, total, error = %e, "Upstream attempt failed");
                    self.record(source_id, false, attempt, &url, Some(e.clone()));
                    last_error = e;
                    if attempt < total {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(FetchError::Exhausted {
            source_id: source_id.to_string(),
            attempts: total,
            last_error,
        })
    }

    async fn attempt(&self, request: &FetchRequest, expect: &Expect) -> Result<Payload, String> {
        let resp = self
            .transport
            .get(request)
            .await
            .map_err(|e| format!("{e:#}"))?;

        if !resp.is_success() {
            return Err(format!("HTTP {}", resp.status));
        }

        match expect {
            Expect::Text => Ok(Payload::Text(resp.body)),
            Expect::Json => serde_json::from_str(&resp.body)
                .map(Payload::Json)
                .map_err(|e| format!("invalid JSON: {e}")),
        }
    }

    fn record(&mut self, source_id: &str, ok: bool, attempts: u32, url: &str, error: Option<String>) {
        self.status.insert(
            source_id.to_string(),
            SourceStatus {
                ok,
                attempts,
                url: url.to_string(),
                error,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
