//! Tools the model may call, and the results they produce.
//!
//! The tool set is closed: [`Tool`] enumerates every capability the assistant
//! advertises, each backed by one remote workflow. Names the model invents are
//! resolved to [`ToolName::Unknown`] and answered with a fixed placeholder
//! instead of an external call.

pub mod arguments;
pub mod registry;

pub use arguments::UrlArguments;
pub use registry::{ToolRegistry, WorkflowBindings};

use serde_json::json;

use crate::llm::Message;

/// A tool backed by a remote workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Summarize the main content of a webpage.
    PageSummary,
    /// Create a calendar event from event details found on a webpage.
    CreateCalendarEvent,
}

impl Tool {
    /// Every tool, in the order they are advertised.
    pub const ALL: [Tool; 2] = [Tool::PageSummary, Tool::CreateCalendarEvent];

    /// Function name advertised to the model.
    pub fn name(self) -> &'static str {
        match self {
            Self::PageSummary => "page_summary",
            Self::CreateCalendarEvent => "create_calendar_event",
        }
    }

    /// Description advertised to the model.
    pub fn description(self) -> &'static str {
        match self {
            Self::PageSummary => "Summarize the main content of a webpage from its URL.",
            Self::CreateCalendarEvent => {
                "Create a Google Calendar event based on event information found on a webpage."
            }
        }
    }

    fn url_description(self) -> &'static str {
        match self {
            Self::PageSummary => "The webpage URL to retrieve and summarize.",
            Self::CreateCalendarEvent => {
                "The webpage URL that contains event information (date, time, location, etc.)."
            }
        }
    }

    /// JSON schema of the tool's parameters.
    pub fn parameter_schema(self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": self.url_description(),
                }
            },
            "required": ["url"]
        })
    }

    /// Text returned to the model when the workflow call fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::PageSummary => "Error: Failed to summarize the webpage.",
            Self::CreateCalendarEvent => "Error: Failed to create a calendar event from this page.",
        }
    }

    /// Static definition of this tool.
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            parameter_schema: self.parameter_schema(),
        }
    }
}

/// Result of resolving a model-supplied tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolName {
    /// A registered tool.
    Known(Tool),
    /// A name outside the registry, kept verbatim.
    Unknown(String),
}

impl ToolName {
    /// Resolve a name exactly as the model sent it.
    pub fn parse(name: &str) -> Self {
        Tool::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .map_or_else(|| Self::Unknown(name.to_string()), Self::Known)
    }
}

/// Static description of a tool, advertised on the first round only.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Function name.
    pub name: &'static str,
    /// Human-readable purpose.
    pub description: &'static str,
    /// JSON schema of the arguments.
    pub parameter_schema: serde_json::Value,
}

impl ToolDefinition {
    /// `OpenAI` function-tool JSON.
    pub fn to_openai_json(&self) -> serde_json::Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameter_schema,
            }
        })
    }
}

/// Every tool definition in `OpenAI` function-tool JSON.
pub fn openai_tools_json() -> Vec<serde_json::Value> {
    Tool::ALL
        .into_iter()
        .map(|t| t.definition().to_openai_json())
        .collect()
}

/// Fixed fallback texts shared by every tool.
pub const MISSING_URL_MESSAGE: &str = "Error: Missing 'url' parameter.";
pub const INVALID_URL_MESSAGE: &str = "Error: Invalid 'url' parameter.";
pub const EMPTY_OUTPUT_MESSAGE: &str = "Error: The workflow returned no output.";

/// Placeholder returned for a tool name outside the registry.
pub fn not_implemented_message(name: &str) -> String {
    format!("Tool \"{name}\" is not implemented.")
}

/// Outcome of one tool call. `content` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    /// Identifier of the call this answers.
    pub call_id: String,
    /// Tool name as requested by the model.
    pub tool_name: String,
    /// Result or fallback text.
    pub content: String,
}

impl ToolCallResult {
    /// The `tool` role message carrying this result.
    pub fn to_message(&self) -> Message {
        Message::tool(&self.call_id, &self.tool_name, &self.content)
    }
}
