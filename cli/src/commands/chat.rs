//! Interactive chat command

use super::build_agent;
use crate::config::AppConfig;
use crate::interactive::{run_chat_loop, StdinLineSource};
use anyhow::Result;

/// Chat with the weather agent on the terminal
pub async fn chat_command(config: &AppConfig) -> Result<()> {
    let mut agent = build_agent(config)?;
    let mut source = StdinLineSource::new();
    let mut stdout = std::io::stdout();

    let exit = run_chat_loop(&mut agent, &mut source, &mut stdout).await?;
    tracing::debug!("Chat ended: {:?}", exit);
    Ok(())
}
