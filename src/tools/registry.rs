//! Dispatch of model-issued tool calls to their bound workflows.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ArgumentError;
use crate::llm::ToolCall;
use crate::workflow::{WorkflowConfig, WorkflowInvoker};

use super::arguments::{UrlArguments, parse_raw};
use super::{
    EMPTY_OUTPUT_MESSAGE, INVALID_URL_MESSAGE, MISSING_URL_MESSAGE, Tool, ToolCallResult,
    ToolDefinition, ToolName, not_implemented_message,
};

/// Workflow configuration bound to each tool.
#[derive(Debug, Clone)]
pub struct WorkflowBindings {
    /// Workflow behind `page_summary`.
    pub page_summary: WorkflowConfig,
    /// Workflow behind `create_calendar_event`.
    pub calendar: WorkflowConfig,
}

impl WorkflowBindings {
    /// Workflow configuration bound to `tool`.
    pub fn for_tool(&self, tool: Tool) -> &WorkflowConfig {
        match tool {
            Tool::PageSummary => &self.page_summary,
            Tool::CreateCalendarEvent => &self.calendar,
        }
    }
}

/// Dispatches model-issued tool calls to their workflows.
///
/// Dispatch never fails: argument problems, unknown tools and workflow errors
/// are all turned into explanatory result text so the conversation can move
/// on to its final round.
#[derive(Clone)]
pub struct ToolRegistry {
    invoker: Arc<dyn WorkflowInvoker>,
    bindings: WorkflowBindings,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("bindings", &self.bindings)
            .field("invoker", &"WorkflowInvoker")
            .finish()
    }
}

impl ToolRegistry {
    pub fn new(invoker: Arc<dyn WorkflowInvoker>, bindings: WorkflowBindings) -> Self {
        Self { invoker, bindings }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Tool::ALL.into_iter().map(Tool::definition).collect()
    }

    /// Tool definitions in `OpenAI` function schema format.
    pub fn openai_tools_json(&self) -> Vec<Value> {
        super::openai_tools_json()
    }

    /// Execute one tool call. Always yields exactly one result for `call`.
    pub async fn dispatch(&self, call: &ToolCall, actor_id: &str) -> ToolCallResult {
        let name = &call.function.name;

        let args = match parse_raw(&call.function.arguments) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    name: "tool.arguments.invalid",
                    tool_id = %call.id,
                    tool_name = %name,
                    raw_arguments = %call.function.arguments,
                    error = %e,
                    "Failed to parse tool arguments, using empty arguments"
                );
                Value::Object(Map::new())
            }
        };

        let content = match ToolName::parse(name) {
            ToolName::Known(tool) => self.run(tool, &args, &call.id, actor_id).await,
            ToolName::Unknown(unknown) => {
                tracing::warn!(
                    name: "tool.unknown",
                    tool_id = %call.id,
                    tool_name = %unknown,
                    "Model requested an unregistered tool"
                );
                not_implemented_message(&unknown)
            }
        };

        ToolCallResult {
            call_id: call.id.clone(),
            tool_name: name.clone(),
            content,
        }
    }

    /// Execute every call concurrently. Results keep the order of `calls`,
    /// not completion order.
    pub async fn dispatch_all(&self, calls: &[ToolCall], actor_id: &str) -> Vec<ToolCallResult> {
        futures::future::join_all(calls.iter().map(|call| self.dispatch(call, actor_id))).await
    }

    async fn run(&self, tool: Tool, args: &Value, call_id: &str, actor_id: &str) -> String {
        let args = match UrlArguments::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(
                    name: "tool.arguments.rejected",
                    tool_id = %call_id,
                    tool_name = tool.name(),
                    error = %e,
                    "Tool arguments failed validation"
                );
                return match e {
                    ArgumentError::InvalidParameter(_) => INVALID_URL_MESSAGE,
                    ArgumentError::MissingParameter(_) | ArgumentError::Parse(_) => {
                        MISSING_URL_MESSAGE
                    }
                }
                .to_string();
            }
        };

        tracing::info!(
            name: "tool.dispatch.started",
            tool_id = %call_id,
            tool_name = tool.name(),
            url = %args.url,
            "Calling workflow"
        );

        let config = self.bindings.for_tool(tool);
        match self.invoker.invoke(config, &args.url, actor_id).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(
                    name: "tool.dispatch.empty",
                    tool_id = %call_id,
                    tool_name = tool.name(),
                    "Workflow succeeded without output"
                );
                EMPTY_OUTPUT_MESSAGE.to_string()
            }
            Ok(text) => {
                tracing::info!(
                    name: "tool.dispatch.completed",
                    tool_id = %call_id,
                    tool_name = tool.name(),
                    result_length = text.len(),
                    "Workflow call succeeded"
                );
                text
            }
            Err(e) => {
                tracing::error!(
                    name: "tool.dispatch.failed",
                    tool_id = %call_id,
                    tool_name = tool.name(),
                    upstream = e.is_upstream(),
                    error = %e,
                    "Workflow call failed"
                );
                tool.failure_message().to_string()
            }
        }
    }
}
