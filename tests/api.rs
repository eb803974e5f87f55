//! Host-facing HTTP surface over stubbed collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use url_tool_assistant::AppState;
use url_tool_assistant::error::ModelError;
use url_tool_assistant::llm::orchestrator::APOLOGY_REPLY;
use url_tool_assistant::llm::{
    ConversationOrchestrator, Message, MessageRole, ModelRequest, ModelService, ToolCall,
};
use url_tool_assistant::server::{TurnResponse, router};

use common::{
    ScriptedModel, StubWorkflow, orchestrator, registry, tool_calls, tool_messages,
};

fn server(model: Arc<ScriptedModel>, workflow: Arc<StubWorkflow>) -> TestServer {
    let state = AppState {
        orchestrator: Arc::new(orchestrator(model, workflow)),
        request_timeout: Duration::from_secs(30),
    };
    TestServer::new(router(state)).unwrap()
}

/// Model that never answers.
struct StalledModel;

#[async_trait::async_trait]
impl ModelService for StalledModel {
    async fn complete(&self, _request: ModelRequest) -> Result<Message, ModelError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = server(ScriptedModel::new(vec![]), Arc::new(StubWorkflow::new()));

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    assert_eq!(resp.text(), "ok");
}

#[tokio::test]
async fn tools_lists_both_definitions() {
    let server = server(ScriptedModel::new(vec![]), Arc::new(StubWorkflow::new()));

    let tools: Vec<Value> = server.get("/api/tools").await.json();
    let names: Vec<_> = tools
        .iter()
        .map(|t| t["function"]["name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names, ["page_summary", "create_calendar_event"]);
    assert_eq!(
        tools[0]["function"]["parameters"]["required"],
        json!(["url"])
    );
}

#[tokio::test]
async fn turn_runs_tools_and_returns_reply() {
    let model = ScriptedModel::new(vec![
        Ok(tool_calls(vec![ToolCall::function(
            "call_1",
            "page_summary",
            r#"{"url":"https://example.com"}"#,
        )])),
        Ok(Message::assistant("It is a page about examples, woof.")),
    ]);
    let workflow = Arc::new(StubWorkflow::new().respond(
        "https://example.com",
        json!({"data": {"outputs": {"text": "Examples."}}}),
    ));
    let server = server(model.clone(), workflow.clone());

    let resp: TurnResponse = server
        .post("/api/turn")
        .json(&json!({
            "history": [
                { "role": "assistant", "content": "Hi!" },
                { "role": "user", "content": "What is on https://example.com?" }
            ],
            "actor_id": "user-42"
        }))
        .await
        .json();

    assert_eq!(
        resp.reply.as_deref(),
        Some("It is a page about examples, woof.")
    );

    let requests = model.requests();
    assert_eq!(requests[0].messages[0].role, MessageRole::System);
    assert_eq!(requests[0].messages[1], Message::assistant("Hi!"));
    assert_eq!(
        requests[0].messages[2],
        Message::user("What is on https://example.com?")
    );
    assert_eq!(tool_messages(&requests[1])[0].text(), "Examples.");

    let invocations = workflow.invocations.lock().unwrap();
    assert_eq!(invocations[0].actor_id, "user-42");
}

#[tokio::test]
async fn blank_reply_is_null() {
    let model = ScriptedModel::new(vec![Ok(Message::assistant("   "))]);
    let server = server(model, Arc::new(StubWorkflow::new()));

    let resp = server
        .post("/api/turn")
        .json(&json!({ "history": [{ "role": "user", "content": "hi" }], "actor_id": "a" }))
        .await;

    resp.assert_status_ok();
    resp.assert_json(&json!({ "reply": null }));
}

#[tokio::test]
async fn model_failure_returns_apology() {
    let model = ScriptedModel::new(vec![Err(ModelError::Status {
        status: 500,
        body: "boom".to_string(),
    })]);
    let server = server(model, Arc::new(StubWorkflow::new()));

    let resp = server
        .post("/api/turn")
        .json(&json!({ "history": [{ "role": "user", "content": "hi" }], "actor_id": "a" }))
        .await;

    resp.assert_status_ok();
    resp.assert_json(&json!({ "reply": APOLOGY_REPLY }));
}

#[tokio::test]
async fn history_rejects_non_conversation_roles() {
    let model = ScriptedModel::new(vec![]);
    let server = server(model.clone(), Arc::new(StubWorkflow::new()));

    let resp = server
        .post("/api/turn")
        .json(&json!({ "history": [{ "role": "tool", "content": "x" }], "actor_id": "a" }))
        .expect_failure()
        .await;

    resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn request_exceeding_timeout_gets_408() {
    let state = AppState {
        orchestrator: Arc::new(ConversationOrchestrator::new(
            Arc::new(StalledModel),
            registry(Arc::new(StubWorkflow::new())),
        )),
        request_timeout: Duration::from_millis(100),
    };
    let server = TestServer::new(router(state)).unwrap();

    let resp = server
        .post("/api/turn")
        .json(&json!({ "history": [{ "role": "user", "content": "hi" }], "actor_id": "a" }))
        .expect_failure()
        .await;

    resp.assert_status(StatusCode::REQUEST_TIMEOUT);
    assert_eq!(resp.text(), "Request timed out");

    // Routes that finish in time are unaffected.
    server.get("/health").await.assert_status_ok();
}
