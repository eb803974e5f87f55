//! Axum host surface: builds the orchestrator from configuration and serves
//! the turn API.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::llm::{ChatCompletionsDriver, ConversationOrchestrator, Message, MessageRole};
use crate::tools::ToolRegistry;
use crate::workflow::HttpWorkflowClient;

/// Build the orchestrator and its collaborators from configuration.
pub fn build_state(config: &AppConfig) -> AppState {
    let settings = config.llm_settings();
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    for name in config.missing_credentials() {
        tracing::warn!(
            name: "workflow.credential.missing",
            workflow = name,
            "No credential configured; calls to this workflow will be rejected upstream"
        );
    }

    let model = Arc::new(ChatCompletionsDriver::new(settings));
    let workflows = Arc::new(HttpWorkflowClient::new(
        config.workflow_timeout(),
        config.workflows.max_in_flight,
    ));
    let tools = ToolRegistry::new(workflows, config.workflow_bindings());

    for def in tools.definitions() {
        info!(name: "tool.registered", tool = def.name, "Tool registered");
    }

    AppState {
        orchestrator: Arc::new(ConversationOrchestrator::new(model, tools)),
        request_timeout: config.request_timeout(),
    }
}

/// Routes of the host surface with tracing and the request timeout applied.
pub fn router(state: AppState) -> Router {
    let timeout_duration = state.request_timeout;

    Router::new()
        .route("/health", get(health))
        .route("/api/tools", get(api_tools))
        .route("/api/turn", post(api_turn))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(build_state(&config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// One prior turn supplied by the host, already cleaned of platform markup.
#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

/// Request body for the turn API.
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    /// Prior turns, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Opaque identifier forwarded to workflows for attribution.
    pub actor_id: String,
}

/// Response from the turn API. `reply` is `null` when there is nothing to send.
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: Option<String>,
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/tools - Tool definitions advertised to the model.
async fn api_tools(State(state): State<AppState>) -> Json<Vec<serde_json::Value>> {
    Json(state.orchestrator.tools().openai_tools_json())
}

/// POST /api/turn - Run one conversational turn and return the reply.
async fn api_turn(
    State(state): State<AppState>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, (StatusCode, String)> {
    tracing::info!(
        actor_id = %req.actor_id,
        history_len = req.history.len(),
        "Received turn request"
    );

    let mut history = Vec::with_capacity(req.history.len());
    for entry in req.history {
        let msg = match entry.role {
            MessageRole::User => Message::user(entry.content),
            MessageRole::Assistant => Message::assistant(entry.content),
            other => {
                return Err((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("history entries must be user or assistant, got {other:?}"),
                ));
            }
        };
        history.push(msg);
    }

    let reply = state
        .orchestrator
        .reply_to_turn(history, &req.actor_id)
        .await;

    Ok(Json(TurnResponse {
        reply: (!reply.trim().is_empty()).then_some(reply),
    }))
}
