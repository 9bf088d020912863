//! Base agent trait and structures

use super::config::AgentConfig;
use crate::error::Result;
use crate::llm::{converse_message_json, FinishReason, LlmMessage, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for agent operations
pub type AgentResult<T> = Result<T>;

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run one prompt through the agent and return its final message
    async fn invoke(&mut self, prompt: &str) -> AgentResult<AgentResponse>;

    /// Get the agent's configuration
    fn config(&self) -> &AgentConfig;

    /// Get the agent's name
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Forget the conversation so far
    fn reset(&mut self) {}
}

/// Final outcome of one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Last assistant message
    pub message: LlmMessage,

    /// Why the model stopped
    pub finish_reason: Option<FinishReason>,

    /// Token usage summed over every model call
    pub usage: Usage,

    /// Number of event loop cycles executed
    pub cycles: usize,

    /// Trace id of the `invoke_agent` span, for log correlation
    #[serde(default)]
    pub trace_id: Option<String>,
}

impl AgentResponse {
    pub fn new(message: LlmMessage) -> Self {
        Self {
            message,
            finish_reason: Some(FinishReason::Stop),
            usage: Usage::default(),
            cycles: 1,
            trace_id: None,
        }
    }

    /// Text of the final message
    pub fn text(&self) -> String {
        self.message.get_text().unwrap_or_default()
    }

    /// The final message in Converse form, `{"role", "content": [{"text"}]}`
    pub fn message_json(&self) -> serde_json::Value {
        converse_message_json(&self.message)
    }
}

impl fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_and_json() {
        let response = AgentResponse::new(LlmMessage::assistant("Sunny, 72F"));
        assert_eq!(response.to_string(), "Sunny, 72F");
        assert_eq!(
            response.message_json(),
            json!({"role": "assistant", "content": [{"text": "Sunny, 72F"}]})
        );
    }
}
