//! Language-model service abstractions.
//!
//! The [`ModelService`] trait is the seam between the conversation
//! orchestrator and whatever backend answers chat requests. The production
//! implementation is [`ChatCompletionsDriver`], which speaks the `OpenAI`
//! Chat Completions API (`/v1/chat/completions`); tests substitute stubs.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use url_tool_assistant::llm::{ChatCompletionsDriver, LlmSettings};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: Some("sk-...".to_string()),
//!     model: "gpt-4o-mini".to_string(),
//!     timeout: Duration::from_secs(60),
//! };
//! let driver = ChatCompletionsDriver::new(settings);
//! ```

pub mod chat_completions;
pub mod orchestrator;

pub use chat_completions::ChatCompletionsDriver;
pub use orchestrator::ConversationOrchestrator;

use std::time::Duration;

use crate::error::ModelError;

/// Default upper bound on one model round.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Upper bound on a single round, including reading the body.
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
    /// Tool response.
    Tool,
}

/// A message in a conversation.
///
/// Serializes to the Chat Completions wire shape: tool messages carry
/// `tool_call_id` and `name`, assistant messages may carry `tool_calls`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content. `None` only for assistant messages that consist solely of
    /// tool calls.
    #[serde(default)]
    pub content: Option<String>,
    /// Identifier of the tool call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
        }
    }

    /// A system directive.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    /// A plain assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// A tool result answering the call `tool_call_id`.
    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            tool_calls: None,
        }
    }

    /// Tool calls carried by this message; empty for anything but a
    /// tool-calling assistant message.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    /// The text content, or an empty string if there is none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    /// Opaque identifier, echoed back in the matching tool message.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    /// Function details.
    pub function: ToolCallFunction,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Build a function tool call.
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: ToolCallFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function details in a tool call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    #[serde(default)]
    pub arguments: String,
}

/// How the model may use the advertised tools. A round that must not call
/// tools advertises none instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to call a tool.
    #[default]
    Auto,
}

/// One request to the model service.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Conversation messages, oldest first.
    pub messages: Vec<Message>,
    /// Tools in `OpenAI` function schema format. Empty means none advertised.
    pub tools: Vec<serde_json::Value>,
    /// Tool choice policy; only meaningful when `tools` is non-empty.
    pub tool_choice: Option<ToolChoice>,
}

/// Language-model backend used by the orchestrator.
#[async_trait::async_trait]
pub trait ModelService: Send + Sync {
    /// Run one round and return the assistant message.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the service is unreachable, answers with a
    /// non-success status, or returns a malformed body.
    async fn complete(&self, request: ModelRequest) -> Result<Message, ModelError>;
}
