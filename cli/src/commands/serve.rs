//! Agent runtime service command

use super::build_agent;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use weather_agent_core::runtime::serve;

/// Serve `/invocations` and `/ping` until Ctrl-C
pub async fn serve_command(config: &AppConfig) -> Result<()> {
    let agent = build_agent(config)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    };

    serve(Box::new(agent), &config.runtime, shutdown)
        .await
        .with_context(|| format!("Agent runtime failed on {}", config.runtime.bind_addr()))
}
