//! Payload handling for one runtime invocation

use crate::agent::Agent;
use crate::error::{Result, RuntimeError};
use serde_json::{json, Value};

/// Invoke `agent` with `payload.prompt` and wrap the final message as
/// `{"result": {"role": "assistant", "content": [...]}}`
pub async fn handle_invocation(agent: &mut dyn Agent, payload: &Value) -> Result<Value> {
    let prompt = payload
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or(RuntimeError::MissingPrompt)?;

    tracing::debug!("Invoking agent for runtime request");
    let response = agent.invoke(prompt).await?;

    Ok(json!({ "result": response.message_json() }))
}
