//! Agent configuration structures

use super::core::AgentCore;
use super::prompt::WEATHER_SYSTEM_PROMPT;
use crate::config::{ModelConfig, TraceAttributes};
use crate::error::Result;
use crate::llm::{BedrockClient, LlmClient};
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Name reported as `gen_ai.agent.name`
    pub name: String,

    /// Maximum number of event loop cycles per invocation
    pub max_cycles: usize,

    /// Messages kept in the conversation; 0 keeps everything
    pub window_size: usize,

    /// List of tools available to this agent
    pub tools: Vec<String>,

    /// Custom system prompt for the agent (optional)
    /// If not provided, the weather prompt is used
    pub system_prompt: Option<String>,

    /// Attributes attached to every `invoke_agent` span
    pub trace_attributes: TraceAttributes,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "weather_agent".to_string(),
            max_cycles: 20,
            window_size: 40,
            tools: vec!["http_request".to_string()],
            system_prompt: None,
            trace_attributes: TraceAttributes::default(),
        }
    }
}

impl AgentConfig {
    /// The configured system prompt, or the weather prompt
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(WEATHER_SYSTEM_PROMPT)
    }
}

/// Builder for creating agents from model configuration
pub struct AgentBuilder {
    model_config: ModelConfig,
    agent_config: AgentConfig,
    tool_registry: ToolRegistry,
}

impl AgentBuilder {
    /// Create a new agent builder with model configuration
    pub fn new(model_config: ModelConfig) -> Self {
        Self {
            model_config,
            agent_config: AgentConfig::default(),
            tool_registry: ToolRegistry::default(),
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum event loop cycles
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.agent_config.max_cycles = max_cycles;
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.agent_config.tools = tools;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.agent_config.system_prompt = system_prompt;
        self
    }

    /// Set span attributes
    pub fn with_trace_attributes(mut self, trace_attributes: TraceAttributes) -> Self {
        self.agent_config.trace_attributes = trace_attributes;
        self
    }

    /// Use a custom tool registry
    pub fn with_tool_registry(mut self, tool_registry: ToolRegistry) -> Self {
        self.tool_registry = tool_registry;
        self
    }

    /// Build the agent against Bedrock
    pub fn build(self) -> Result<AgentCore> {
        self.model_config.validate()?;
        let client = BedrockClient::new(&self.model_config)?;
        Ok(self.build_with_client(Arc::new(client)))
    }

    /// Build the agent with the given LLM client
    pub fn build_with_client(self, llm_client: Arc<dyn LlmClient>) -> AgentCore {
        let tool_executor = self.tool_registry.create_executor(&self.agent_config.tools);
        AgentCore::new(
            self.agent_config,
            llm_client,
            tool_executor,
            (&self.model_config.params).into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.name, "weather_agent");
        assert_eq!(config.tools, vec!["http_request"]);
        assert_eq!(config.system_prompt, None);
        assert_eq!(config.effective_system_prompt(), WEATHER_SYSTEM_PROMPT);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"system_prompt": "Custom prompt", "max_cycles": 3}"#).unwrap();

        assert_eq!(config.effective_system_prompt(), "Custom prompt");
        assert_eq!(config.max_cycles, 3);
        assert_eq!(config.window_size, 40);
        assert_eq!(config.name, "weather_agent");
        assert_eq!(config.trace_attributes.user_id, "demo-123");
    }

    #[test]
    fn test_build_requires_bearer_token() {
        let result = AgentBuilder::new(ModelConfig::default()).build();
        assert!(result.is_err());
    }
}
