//! Two-round conversation orchestrator.
//!
//! One turn runs through:
//! 1. Prepend the fixed system directive to the supplied history
//! 2. Round 1: ask the model with every tool advertised (`tool_choice: auto`)
//! 3. No tool calls: return the round-1 content as the reply
//! 4. Otherwise execute every tool call through the [`ToolRegistry`]
//! 5. Append the round-1 assistant message and the tool results, in call order
//! 6. Round 2: ask again without tools and return that content
//!
//! Tool failures never abort a turn; only a failing model round does.
//!
//! # Example
//!
//! ```rust,ignore
//! use url_tool_assistant::llm::{ConversationOrchestrator, Message};
//!
//! let orchestrator = ConversationOrchestrator::new(model, registry);
//! let reply = orchestrator
//!     .reply_to_turn(vec![Message::user("Summarize https://example.com")], "user-42")
//!     .await;
//! ```

use std::sync::Arc;

use uuid::Uuid;

use crate::error::ModelError;
use crate::tools::{ToolCallResult, ToolRegistry};

use super::{Message, ModelRequest, ModelService, ToolChoice};

/// Persona and tool-use policy prepended to every conversation.
pub const SYSTEM_DIRECTIVE: &str = "\
You are Chappy, a friendly chat assistant: an oddly clever, mysterious dog who can speak human language. \
You refer to yourself as \"I\" and every now and then, as if you just remembered, you end a sentence with \"woof\". \
Read the recent messages in this channel, follow the flow of the conversation, and reply in context.
Call the \"page_summary\" tool **only when the latest user message explicitly asks about the content behind a URL**.
Call the \"create_calendar_event\" tool **only when the latest user message explicitly asks to add the event at a URL to a calendar**.";

/// Reply sent to the host when a model round fails.
pub const APOLOGY_REPLY: &str = "Sorry, something went wrong on my side… please try again in a moment 🥲";

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Final answer text.
    pub reply: String,
    /// Tool results in request order; empty when no tools were called.
    pub tool_results: Vec<ToolCallResult>,
}

/// Drives the two-round exchange between the model and the workflow tools.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    model: Arc<dyn ModelService>,
    tools: ToolRegistry,
}

impl std::fmt::Debug for ConversationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationOrchestrator")
            .field("tools", &self.tools)
            .finish()
    }
}

impl ConversationOrchestrator {
    /// Create an orchestrator over `model` with the tools in `tools`.
    pub fn new(model: Arc<dyn ModelService>, tools: ToolRegistry) -> Self {
        Self { model, tools }
    }

    /// Registry advertised on round one.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if either model round fails. Tool failures are
    /// folded into the conversation instead.
    pub async fn handle_turn(
        &self,
        history: Vec<Message>,
        actor_id: &str,
    ) -> Result<String, ModelError> {
        self.run_turn(history, actor_id).await.map(|o| o.reply)
    }

    /// Run one turn for the host: a model failure is logged and replaced by
    /// [`APOLOGY_REPLY`].
    pub async fn reply_to_turn(&self, history: Vec<Message>, actor_id: &str) -> String {
        match self.handle_turn(history, actor_id).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    name: "turn.failed",
                    actor_id = %actor_id,
                    error = %e,
                    error_debug = ?e,
                    "Model service failed, replying with apology"
                );
                APOLOGY_REPLY.to_string()
            }
        }
    }

    /// Run one turn and return the reply together with the tool results.
    #[tracing::instrument(name = "turn", skip_all, fields(turn_id = %Uuid::new_v4(), actor_id = %actor_id))]
    pub async fn run_turn(
        &self,
        history: Vec<Message>,
        actor_id: &str,
    ) -> Result<TurnOutcome, ModelError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(SYSTEM_DIRECTIVE));
        messages.extend(history);

        tracing::info!(
            name: "turn.round1.started",
            message_count = messages.len(),
            "Asking model whether tools are needed"
        );

        let first = self
            .model
            .complete(ModelRequest {
                messages: messages.clone(),
                tools: self.tools.openai_tools_json(),
                tool_choice: Some(ToolChoice::Auto),
            })
            .await?;

        if first.tool_calls().is_empty() {
            tracing::info!(
                name: "turn.completed",
                rounds = 1,
                reply_length = first.text().len(),
                "No tool calls requested"
            );
            return Ok(TurnOutcome {
                reply: first.content.unwrap_or_default(),
                tool_results: Vec::new(),
            });
        }

        let calls = first.tool_calls().to_vec();
        tracing::info!(
            name: "turn.tools.requested",
            tool_call_count = calls.len(),
            "Executing tool calls"
        );

        let results = self.tools.dispatch_all(&calls, actor_id).await;
        debug_assert_eq!(results.len(), calls.len());

        messages.push(first);
        messages.extend(results.iter().map(ToolCallResult::to_message));

        tracing::info!(
            name: "turn.round2.started",
            message_count = messages.len(),
            "Asking model for the final answer"
        );

        let second = self
            .model
            .complete(ModelRequest {
                messages,
                tools: Vec::new(),
                tool_choice: None,
            })
            .await?;

        tracing::info!(
            name: "turn.completed",
            rounds = 2,
            reply_length = second.text().len(),
            "Final answer produced"
        );

        Ok(TurnOutcome {
            reply: second.content.unwrap_or_default(),
            tool_results: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::WorkflowError;
    use crate::llm::{MessageRole, ToolCall};
    use crate::tools::WorkflowBindings;
    use crate::workflow::{WorkflowConfig, WorkflowCredential, WorkflowInvoker};

    struct ScriptedModel {
        replies: Mutex<Vec<Result<Message, ModelError>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<Message, ModelError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ModelService for ScriptedModel {
        async fn complete(&self, request: ModelRequest) -> Result<Message, ModelError> {
            self.requests.lock().unwrap().push(request);
            self.replies.lock().unwrap().remove(0)
        }
    }

    struct EchoWorkflow;

    #[async_trait::async_trait]
    impl WorkflowInvoker for EchoWorkflow {
        async fn invoke(
            &self,
            _config: &WorkflowConfig,
            url: &str,
            _actor_id: &str,
        ) -> Result<String, WorkflowError> {
            Ok(format!("summary of {url}"))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(
            Arc::new(EchoWorkflow),
            WorkflowBindings {
                page_summary: WorkflowConfig::new("https://wf", WorkflowCredential::new("a")),
                calendar: WorkflowConfig::new("https://wf", WorkflowCredential::new("b")),
            },
        )
    }

    fn tool_call_reply(calls: Vec<ToolCall>) -> Message {
        Message {
            role: MessageRole::Assistant,
            content: None,
            tool_call_id: None,
            name: None,
            tool_calls: Some(calls),
        }
    }

    #[tokio::test]
    async fn directive_is_prepended_and_tools_advertised_on_round_one() {
        let model = ScriptedModel::new(vec![Ok(Message::assistant("hi"))]);
        let orch = ConversationOrchestrator::new(model.clone(), registry());

        orch.handle_turn(vec![Message::user("hello")], "u1").await.unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].role, MessageRole::System);
        assert_eq!(requests[0].messages[0].text(), SYSTEM_DIRECTIVE);
        assert_eq!(requests[0].messages[1], Message::user("hello"));
        assert_eq!(requests[0].tools.len(), 2);
        assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
    }

    #[tokio::test]
    async fn round_two_has_no_tools_and_extends_history() {
        let model = ScriptedModel::new(vec![
            Ok(tool_call_reply(vec![ToolCall::function(
                "c1",
                "page_summary",
                r#"{"url":"https://x"}"#,
            )])),
            Ok(Message::assistant("final")),
        ]);
        let orch = ConversationOrchestrator::new(model.clone(), registry());

        let outcome = orch
            .run_turn(vec![Message::user("what is on https://x?")], "u1")
            .await
            .unwrap();

        assert_eq!(outcome.reply, "final");
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert!(second.tools.is_empty());
        assert_eq!(second.tool_choice, None);
        // system, user, assistant(tool_calls), tool
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[..2], requests[0].messages[..]);
        assert_eq!(second.messages[2].tool_calls().len(), 1);
        assert_eq!(second.messages[3], Message::tool("c1", "page_summary", "summary of https://x"));
    }

    #[tokio::test]
    async fn round_two_failure_is_fatal() {
        let model = ScriptedModel::new(vec![
            Ok(tool_call_reply(vec![ToolCall::function("c1", "foo", "{}")])),
            Err(ModelError::NoChoices),
        ]);
        let orch = ConversationOrchestrator::new(model, registry());

        let err = orch.handle_turn(vec![Message::user("x")], "u1").await;
        assert!(matches!(err, Err(ModelError::NoChoices)));
    }

    #[tokio::test]
    async fn model_failure_becomes_apology_for_host() {
        let model = ScriptedModel::new(vec![Err(ModelError::Status {
            status: 503,
            body: "overloaded".into(),
        })]);
        let orch = ConversationOrchestrator::new(model, registry());

        let reply = orch.reply_to_turn(vec![Message::user("x")], "u1").await;
        assert_eq!(reply, APOLOGY_REPLY);
    }

    #[tokio::test]
    async fn absent_content_without_tool_calls_is_empty_reply() {
        let mut reply = Message::assistant("");
        reply.content = None;
        let model = ScriptedModel::new(vec![Ok(reply)]);
        let orch = ConversationOrchestrator::new(model, registry());

        assert_eq!(orch.handle_turn(vec![], "u1").await.unwrap(), "");
    }
}
