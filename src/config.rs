//! Layered application configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional config
//! file, `ASSISTANT_`-prefixed environment variables (`__` separates nested
//! keys, e.g. `ASSISTANT_SERVER__PORT`), the environment names of earlier
//! deployments, then command-line flags.

use std::env;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::llm::LlmSettings;
use crate::tools::WorkflowBindings;
use crate::workflow::{WorkflowConfig, WorkflowCredential};

/// Shared default for both workflow endpoints.
pub const DEFAULT_WORKFLOW_ENDPOINT: &str = "https://api.dify.ai/v1/workflows/run";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Model identifier to use for both rounds
    #[arg(long)]
    pub model: Option<String>,

    /// Per-call workflow timeout in milliseconds
    #[arg(long)]
    pub workflow_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub workflows: WorkflowsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Upper bound on a whole turn served over HTTP.
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound on one model round.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowsConfig {
    pub page_summary: WorkflowEndpointConfig,
    pub calendar: WorkflowEndpointConfig,
    pub timeout_ms: u64,
    pub max_in_flight: usize,
}

#[derive(Deserialize, Clone)]
pub struct WorkflowEndpointConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for WorkflowEndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEndpointConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl WorkflowEndpointConfig {
    fn to_workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig::new(&self.endpoint, WorkflowCredential::new(&self.api_key))
    }
}

/// Environment names used by earlier deployments, mapped onto config keys.
/// Applied only when the matching `ASSISTANT_` variable is unset.
const LEGACY_ENV: [(&str, &str, &str); 5] = [
    ("OPENAI_API_KEY", "ASSISTANT_LLM__API_KEY", "llm.api_key"),
    ("OPENAI_MODEL", "ASSISTANT_LLM__MODEL", "llm.model"),
    ("OPENAI_BASE_URL", "ASSISTANT_LLM__BASE_URL", "llm.base_url"),
    (
        "DIFY_PAGE_SUMMARY_API_KEY",
        "ASSISTANT_WORKFLOWS__PAGE_SUMMARY__API_KEY",
        "workflows.page_summary.api_key",
    ),
    (
        "DIFY_CALENDAR_API_KEY",
        "ASSISTANT_WORKFLOWS__CALENDAR__API_KEY",
        "workflows.calendar.api_key",
    ),
];

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 180)?
            .set_default("llm.base_url", "https://api.openai.com")?
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.timeout_secs", 60)?
            .set_default("workflows.page_summary.endpoint", DEFAULT_WORKFLOW_ENDPOINT)?
            .set_default("workflows.page_summary.api_key", "")?
            .set_default("workflows.calendar.endpoint", DEFAULT_WORKFLOW_ENDPOINT)?
            .set_default("workflows.calendar.api_key", "")?
            .set_default("workflows.timeout_ms", 60_000)?
            .set_default("workflows.max_in_flight", 4)?;

        // 2. Config file: explicit path, else ./config.{yaml,toml,json} if present
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Environment variables (prefixed with ASSISTANT_), e.g. ASSISTANT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("ASSISTANT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Legacy environment names
        for (legacy, prefixed, key) in LEGACY_ENV {
            if env::var_os(prefixed).is_some() {
                continue;
            }
            if let Ok(val) = env::var(legacy) {
                builder = builder.set_override(key, val)?;
            }
        }
        // One URL served both workflows in earlier deployments.
        if let Ok(val) = env::var("DIFY_WORKFLOW_URL") {
            for (prefixed, key) in [
                (
                    "ASSISTANT_WORKFLOWS__PAGE_SUMMARY__ENDPOINT",
                    "workflows.page_summary.endpoint",
                ),
                (
                    "ASSISTANT_WORKFLOWS__CALENDAR__ENDPOINT",
                    "workflows.calendar.endpoint",
                ),
            ] {
                if env::var_os(prefixed).is_none() {
                    builder = builder.set_override(key, val.clone())?;
                }
            }
        }

        // 5. CLI overrides
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(ms) = cli.workflow_timeout_ms {
            builder = builder.set_override("workflows.timeout_ms", ms)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "llm.model cannot be empty".to_string(),
            ));
        }
        Url::parse(&self.llm.base_url).map_err(|e| {
            config::ConfigError::Message(format!("invalid llm.base_url '{}': {e}", self.llm.base_url))
        })?;
        for (key, wf) in [
            ("page_summary", &self.workflows.page_summary),
            ("calendar", &self.workflows.calendar),
        ] {
            Url::parse(&wf.endpoint).map_err(|e| {
                config::ConfigError::Message(format!(
                    "invalid workflows.{key}.endpoint '{}': {e}",
                    wf.endpoint
                ))
            })?;
        }
        if self.llm.timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "llm.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.workflows.timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "workflows.timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.workflows.max_in_flight == 0 {
            return Err(config::ConfigError::Message(
                "workflows.max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Names of workflows that have no credential configured.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let bindings = self.workflow_bindings();
        [
            ("page_summary", &bindings.page_summary),
            ("calendar", &bindings.calendar),
        ]
        .into_iter()
        .filter(|(_, wf)| wf.credential.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            base_url: self.llm.base_url.clone(),
            api_key: self
                .llm
                .api_key
                .clone()
                .filter(|s| !s.trim().is_empty()),
            model: self.llm.model.clone(),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }

    pub fn workflow_bindings(&self) -> WorkflowBindings {
        WorkflowBindings {
            page_summary: self.workflows.page_summary.to_workflow_config(),
            calendar: self.workflows.calendar.to_workflow_config(),
        }
    }

    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_millis(self.workflows.timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
