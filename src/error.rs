//! Error types shared by the model driver, the workflow client and the
//! tool dispatcher.
//!
//! Only [`ModelError`] is ever surfaced to the host: every tool-level failure
//! is folded into a [`ToolCallResult`](crate::tools::ToolCallResult) before
//! the second model round.

use std::time::Duration;

use thiserror::Error;

/// Failure talking to the language-model service. Fatal for the current turn.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The request never produced an HTTP response.
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("model service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, captured for diagnostics.
        body: String,
    },

    /// The response body was not the expected top-level shape.
    #[error("malformed model response: {0}")]
    Malformed(String),

    /// The response carried no choices.
    #[error("model response contained no choices")]
    NoChoices,

    /// The round did not finish within the configured bound.
    #[error("model request timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure invoking a remote workflow endpoint.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The workflow answered with a non-success status.
    #[error("workflow returned HTTP {status}: {body}")]
    UpstreamHttp {
        /// HTTP status code.
        status: u16,
        /// Response body, captured for diagnostics.
        body: String,
    },

    /// The per-call timeout elapsed before a response arrived.
    #[error("workflow call timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure.
    #[error("workflow request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The success body was not valid JSON.
    #[error("workflow response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Whether the remote side was reached and refused or stalled, as opposed
    /// to a local/transport failure.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamHttp { .. } | Self::Timeout(_))
    }
}

/// Reasons a tool call's arguments are rejected before any external call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The raw argument text is not valid JSON.
    #[error("arguments are not valid JSON: {0}")]
    Parse(String),

    /// A required parameter is absent or empty.
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    /// A parameter has the wrong JSON type.
    #[error("parameter '{0}' has an invalid type")]
    InvalidParameter(&'static str),
}
