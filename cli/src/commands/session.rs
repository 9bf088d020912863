//! Traced session command

use super::build_agent;
use crate::config::AppConfig;
use crate::interactive::{run_session_loop, StdinLineSource};
use anyhow::Result;
use weather_agent_core::SessionContext;

/// Run a traced session; the session id travels as baggage on every span
pub async fn session_command(config: &AppConfig, session_id: Option<String>) -> Result<()> {
    let session = match session_id {
        Some(id) => SessionContext::with_id(id),
        None => SessionContext::new(),
    };

    let mut config = config.clone();
    config.agent.trace_attributes = config
        .agent
        .trace_attributes
        .with_session_id(session.id());
    let mut agent = build_agent(&config)?;

    let _session_guard = session.attach();
    let mut source = StdinLineSource::new();
    let mut stdout = std::io::stdout();

    let summary = run_session_loop(&mut agent, &mut source, &mut stdout, session.id()).await?;
    tracing::info!(
        "Session {} finished after {} queries",
        session.id(),
        summary.total_queries
    );
    Ok(())
}
