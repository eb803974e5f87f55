//! URL tool assistant
//!
//! A chat assistant that augments a language-model conversation with two
//! remote workflows, webpage summarization and calendar-event creation, which
//! the model calls only when it decides they are needed.
//!
//! # Architecture
//!
//! - **Orchestration**: two-round exchange with the model service; round one
//!   may request tool calls, round two folds their results into the answer
//! - **Tools**: closed set of workflow-backed tools with typed argument
//!   validation; dispatch never fails
//! - **Workflows**: HTTP client for the remote workflow endpoints, with a
//!   per-call timeout and an in-flight bound
//! - **Server**: Axum host surface that takes a formatted history and
//!   returns the reply
//!
//! # Modules
//!
//! - [`llm`]: model service trait, Chat Completions driver, orchestrator
//! - [`tools`]: tool definitions, argument decoding, registry
//! - [`workflow`]: workflow endpoint client
//! - [`config`]: layered configuration
//! - [`error`]: error types

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod tools;
pub mod workflow;

use std::sync::Arc;
use std::time::Duration;

use llm::ConversationOrchestrator;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Orchestrator running each conversational turn.
    pub orchestrator: Arc<ConversationOrchestrator>,
    /// Upper bound on serving one HTTP request.
    pub request_timeout: Duration,
}
