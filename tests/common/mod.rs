//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url_tool_assistant::error::{ModelError, WorkflowError};
use url_tool_assistant::llm::{
    ConversationOrchestrator, Message, MessageRole, ModelRequest, ModelService, ToolCall,
};
use url_tool_assistant::tools::{ToolRegistry, WorkflowBindings};
use url_tool_assistant::workflow::{
    WorkflowConfig, WorkflowCredential, WorkflowInvoker, extract_output_text,
};

pub const SUMMARY_ENDPOINT: &str = "https://workflows.test/summary";
pub const CALENDAR_ENDPOINT: &str = "https://workflows.test/calendar";

/// Model that replays a fixed script and records every request.
pub struct ScriptedModel {
    replies: Mutex<Vec<Result<Message, ModelError>>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<Message, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelService for ScriptedModel {
    async fn complete(&self, request: ModelRequest) -> Result<Message, ModelError> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        assert!(!replies.is_empty(), "model called more often than scripted");
        replies.remove(0)
    }
}

/// Canned workflow behaviour keyed by requested URL.
#[derive(Clone)]
pub enum Canned {
    /// Succeed with this response body after an optional delay.
    Body(serde_json::Value, Duration),
    /// Fail as an upstream HTTP error with this status.
    Status(u16),
}

/// Workflow stub that records invocations and answers from a table.
#[derive(Default)]
pub struct StubWorkflow {
    responses: HashMap<String, Canned>,
    pub invocations: Mutex<Vec<Invocation>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub endpoint: String,
    pub url: String,
    pub actor_id: String,
}

impl StubWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: serde_json::Value) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Body(body, Duration::ZERO));
        self
    }

    pub fn respond_after(mut self, url: &str, body: serde_json::Value, delay: Duration) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Body(body, delay));
        self
    }

    pub fn fail(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), Canned::Status(status));
        self
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl WorkflowInvoker for StubWorkflow {
    async fn invoke(
        &self,
        config: &WorkflowConfig,
        url: &str,
        actor_id: &str,
    ) -> Result<String, WorkflowError> {
        self.invocations.lock().unwrap().push(Invocation {
            endpoint: config.endpoint.clone(),
            url: url.to_string(),
            actor_id: actor_id.to_string(),
        });
        match self.responses.get(url).cloned() {
            Some(Canned::Body(body, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(extract_output_text(&body))
            }
            Some(Canned::Status(status)) => Err(WorkflowError::UpstreamHttp {
                status,
                body: "stub failure".to_string(),
            }),
            None => Err(WorkflowError::UpstreamHttp {
                status: 404,
                body: format!("no canned response for {url}"),
            }),
        }
    }
}

pub fn bindings() -> WorkflowBindings {
    WorkflowBindings {
        page_summary: WorkflowConfig::new(SUMMARY_ENDPOINT, WorkflowCredential::new("summary-key")),
        calendar: WorkflowConfig::new(CALENDAR_ENDPOINT, WorkflowCredential::new("calendar-key")),
    }
}

pub fn registry(workflow: Arc<StubWorkflow>) -> ToolRegistry {
    ToolRegistry::new(workflow, bindings())
}

pub fn orchestrator(model: Arc<ScriptedModel>, workflow: Arc<StubWorkflow>) -> ConversationOrchestrator {
    ConversationOrchestrator::new(model, registry(workflow))
}

/// Assistant message that only requests tool calls.
pub fn tool_calls(calls: Vec<ToolCall>) -> Message {
    Message {
        role: MessageRole::Assistant,
        content: None,
        tool_call_id: None,
        name: None,
        tool_calls: Some(calls),
    }
}

/// Tool-role messages of a request, in order.
pub fn tool_messages(request: &ModelRequest) -> Vec<&Message> {
    request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .collect()
}
