//! Configuration types for Weather Agent core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default Bedrock model identifier (cross-region inference profile)
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

/// Bedrock model selection and access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Bedrock model or inference profile identifier
    pub model_id: String,
    /// AWS region hosting the model
    pub region: String,
    /// Endpoint override; defaults to the regional bedrock-runtime endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bedrock API key sent as a bearer token
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            bearer_token: None,
            params: ModelParams::default(),
        }
    }
}

impl ModelConfig {
    /// Create a model config for the given model in the given region
    pub fn new(model_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    /// Set the bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the endpoint override
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// The endpoint requests are sent to
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_id.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model.model_id".to_string(),
            });
        }

        if self.region.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model.region".to_string(),
            });
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: "model.endpoint".to_string(),
                    value: endpoint.clone(),
                });
            }
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=1.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "model.params.temperature".to_string(),
                    value: temp.to_string(),
                });
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::InvalidValue {
                    field: "model.params.top_p".to_string(),
                    value: top_p.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Custom attributes attached to agent spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceAttributes {
    /// Session identifier, usually filled from baggage at runtime
    pub session_id: Option<String>,
    pub user_email: String,
    pub user_id: String,
    pub tags: Vec<String>,
}

impl Default for TraceAttributes {
    fn default() -> Self {
        Self {
            session_id: None,
            user_email: "demo@example.com".to_string(),
            user_id: "demo-123".to_string(),
            tags: vec![
                "Rust-AgentSDK".to_string(),
                "Observability-Tags".to_string(),
                "CloudWatch-Demo".to_string(),
            ],
        }
    }
}

impl TraceAttributes {
    /// Set the session identifier
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Telemetry export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute
    pub service_name: String,
    /// `service.version` resource attribute
    pub service_version: String,
    /// OTLP/HTTP traces endpoint; spans are not exported when unset
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "weather-agent".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: None,
        }
    }
}

/// Runtime entrypoint bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl RuntimeConfig {
    /// `host:port` bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Remote agent runtime invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeConfig {
    /// ARN of the deployed agent runtime
    #[serde(default)]
    pub agent_runtime_arn: Option<String>,
    pub qualifier: String,
    pub region: String,
    /// Endpoint override; defaults to the regional bedrock-agentcore endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            agent_runtime_arn: None,
            qualifier: "DEFAULT".to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            bearer_token: None,
        }
    }
}

impl InvokeConfig {
    /// The endpoint requests are sent to
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-agentcore.{}.amazonaws.com", self.region),
        }
    }
}
