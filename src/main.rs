//! URL tool assistant server
//!
//! Entry point: loads configuration and serves the turn API.

use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use url_tool_assistant::{config::AppConfig, server};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Initialize tracing (M-LOG-STRUCTURED)
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        workflow_timeout_ms = config.workflows.timeout_ms,
        max_in_flight = config.workflows.max_in_flight,
        "Configuration loaded"
    );

    server::start_server(Arc::new(config)).await
}
