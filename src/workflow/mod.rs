//! Client for remote "workflow" HTTP endpoints.
//!
//! A workflow is an opaque remote service that takes a URL and returns text
//! (a page summary, a calendar confirmation, ...). Every workflow shares the
//! same request shape:
//!
//! ```json
//! { "inputs": { "url": "<url>" }, "response_mode": "blocking", "user": "<actor id>" }
//! ```
//!
//! sent as `POST <endpoint>` with `Authorization: Bearer <tool credential>`.
//! Each tool binds its own [`WorkflowConfig`]; credentials are never shared.
//!
//! [`WorkflowInvoker`] is the seam the tool registry calls through, so tests
//! can substitute a recording stub for [`HttpWorkflowClient`].

mod output;

pub use output::{OUTPUT_FIELDS, extract_output_text};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::WorkflowError;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of workflow calls allowed in flight at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Bearer token for one workflow. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct WorkflowCredential(String);

impl WorkflowCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Whether no usable token is configured.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for WorkflowCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WorkflowCredential(<redacted>)")
    }
}

/// Endpoint and credential for one workflow.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Full URL of the workflow run endpoint.
    pub endpoint: String,
    /// Tool-specific bearer token.
    pub credential: WorkflowCredential,
}

impl WorkflowConfig {
    pub fn new(endpoint: impl Into<String>, credential: WorkflowCredential) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential,
        }
    }
}

/// Invokes a workflow and returns its normalized text output.
#[async_trait::async_trait]
pub trait WorkflowInvoker: Send + Sync {
    /// Run the workflow at `config` for `url` on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UpstreamHttp`] on a non-success status,
    /// [`WorkflowError::Timeout`] when the call does not finish in time, and
    /// transport/decoding errors otherwise.
    async fn invoke(
        &self,
        config: &WorkflowConfig,
        url: &str,
        actor_id: &str,
    ) -> Result<String, WorkflowError>;
}

/// Request body sent to every workflow.
#[derive(Debug, serde::Serialize)]
struct RunRequest<'a> {
    inputs: RunInputs<'a>,
    response_mode: &'static str,
    user: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct RunInputs<'a> {
    url: &'a str,
}

/// HTTP implementation of [`WorkflowInvoker`] with a per-call timeout and an
/// in-flight bound shared by every workflow it calls.
#[derive(Clone)]
pub struct HttpWorkflowClient {
    http: reqwest::Client,
    timeout: Duration,
    inflight: Arc<Semaphore>,
}

impl std::fmt::Debug for HttpWorkflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWorkflowClient")
            .field("timeout", &self.timeout)
            .field("available_permits", &self.inflight.available_permits())
            .finish()
    }
}

impl Default for HttpWorkflowClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_IN_FLIGHT)
    }
}

impl HttpWorkflowClient {
    /// Create a client. `max_in_flight` is clamped to at least one.
    #[must_use]
    pub fn new(timeout: Duration, max_in_flight: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
            inflight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    async fn send(
        &self,
        config: &WorkflowConfig,
        url: &str,
        actor_id: &str,
    ) -> Result<String, WorkflowError> {
        let body = RunRequest {
            inputs: RunInputs { url },
            response_mode: "blocking",
            user: actor_id,
        };

        let resp = self
            .http
            .post(&config.endpoint)
            .bearer_auth(config.credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WorkflowError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok(extract_output_text(&json))
    }
}

#[async_trait::async_trait]
impl WorkflowInvoker for HttpWorkflowClient {
    async fn invoke(
        &self,
        config: &WorkflowConfig,
        url: &str,
        actor_id: &str,
    ) -> Result<String, WorkflowError> {
        // Never closed, so acquire cannot fail in practice.
        let _permit = self.inflight.acquire().await.ok();

        let started = tokio::time::Instant::now();
        let result = tokio::time::timeout(self.timeout, self.send(config, url, actor_id))
            .await
            .map_err(|_elapsed| WorkflowError::Timeout(self.timeout))?;

        tracing::debug!(
            endpoint = %config.endpoint,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Workflow call finished"
        );
        result
    }
}
