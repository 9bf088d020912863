//! CLI command implementations

pub mod chat;
pub mod invoke;
pub mod serve;
pub mod session;
pub mod tools;

pub use chat::chat_command;
pub use invoke::{invoke_command, InvokeArgs};
pub use serve::serve_command;
pub use session::session_command;
pub use tools::tools_command;

use crate::config::AppConfig;
use anyhow::{Context, Result};
use weather_agent_core::{AgentBuilder, AgentCore};

/// Build the Bedrock-backed weather agent from resolved configuration
pub(crate) fn build_agent(config: &AppConfig) -> Result<AgentCore> {
    tracing::debug!(
        "Using model {} in {}",
        config.model.model_id,
        config.model.region
    );

    AgentBuilder::new(config.model.clone())
        .with_agent_config(config.agent.clone())
        .build()
        .context("Failed to create weather agent")
}
