//! OpenAI Chat Completions API driver.
//!
//! This module implements [`ModelService`] for the OpenAI Chat Completions
//! API (`/v1/chat/completions`). Each round is a single blocking request,
//! bounded by [`LlmSettings::timeout`]; the assistant message of the first
//! choice is returned as-is.

use serde::Deserialize;

use crate::error::ModelError;

use super::{LlmSettings, Message, ModelRequest, ModelService};

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn body(&self, req: &ModelRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "messages": req.messages,
        });
        if !req.tools.is_empty() {
            body["tools"] = serde_json::Value::Array(req.tools.clone());
            if let Some(choice) = req.tool_choice {
                body["tool_choice"] = serde_json::to_value(choice).unwrap_or_default();
            }
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Message,
}

impl ChatCompletionsDriver {
    async fn send(&self, req: &ModelRequest) -> Result<Message, ModelError> {
        let url = self.endpoint();
        let body = self.body(req);

        tracing::debug!(
            url = %url,
            message_count = req.messages.len(),
            tool_count = req.tools.len(),
            "Sending chat completion request"
        );

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(ModelError::NoChoices)
    }
}

#[async_trait::async_trait]
impl ModelService for ChatCompletionsDriver {
    async fn complete(&self, req: ModelRequest) -> Result<Message, ModelError> {
        let timeout = self.settings.timeout;
        tokio::time::timeout(timeout, self.send(&req))
            .await
            .map_err(|_elapsed| ModelError::Timeout(timeout))?
    }
}
