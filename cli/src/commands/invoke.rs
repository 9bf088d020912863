//! Remote agent runtime invocation command

use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::io::Write;
use weather_agent_core::invoke::InvokeAgentRuntimeResponse;
use weather_agent_core::{AgentRuntimeClient, InvokeAgentRuntimeRequest};

/// Prompt sent when none is given
pub const DEFAULT_PROMPT: &str = "Hello, how is weather in Miami?";

/// Flags of the `invoke` subcommand
#[derive(Debug, Clone, Default)]
pub struct InvokeArgs {
    pub arn: Option<String>,
    pub qualifier: Option<String>,
    pub prompt: String,
    pub session_id: Option<String>,
    pub bearer_token: Option<String>,
}

impl InvokeArgs {
    /// Build the request, falling back to `invoke.*` configuration
    fn into_request(self, config: &AppConfig) -> Result<(InvokeAgentRuntimeRequest, Option<String>)> {
        let arn = self
            .arn
            .or_else(|| config.invoke.agent_runtime_arn.clone())
            .ok_or_else(|| {
                anyhow!("No agent runtime ARN: pass --arn or set invoke.agent_runtime_arn")
            })?;
        let qualifier = self
            .qualifier
            .unwrap_or_else(|| config.invoke.qualifier.clone());

        let mut request = InvokeAgentRuntimeRequest::new(arn, json!({ "prompt": self.prompt }))
            .with_qualifier(qualifier);
        if let Some(session_id) = self.session_id {
            request = request.with_session_id(session_id);
        }

        let bearer_token = self
            .bearer_token
            .or_else(|| config.invoke.bearer_token.clone());
        Ok((request, bearer_token))
    }
}

/// Invoke a deployed agent runtime and print its response
pub async fn invoke_command(config: &AppConfig, args: InvokeArgs) -> Result<()> {
    let (request, bearer_token) = args.into_request(config)?;

    let mut invoke_config = config.invoke.clone();
    invoke_config.bearer_token = bearer_token;
    let client = AgentRuntimeClient::new(&invoke_config);

    tracing::info!(
        "Invoking {} ({})",
        request.agent_runtime_arn,
        request.qualifier
    );
    let response = client
        .invoke_agent_runtime(request)
        .await
        .context("Agent runtime invocation failed")?;

    write_response(&response, &mut std::io::stdout())
}

/// Metadata block followed by the raw response body
pub fn write_response(response: &InvokeAgentRuntimeResponse, out: &mut impl Write) -> Result<()> {
    let metadata = serde_json::to_string_pretty(&response.metadata())?;
    writeln!(out, "Full Response Metadata: {}", metadata)?;
    writeln!(out, "\nAgent Response: {}", response.body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:bedrock-agentcore:us-east-1:123456789012:runtime/weather_agent";

    fn args(prompt: &str) -> InvokeArgs {
        InvokeArgs {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_from_flags() {
        let config = AppConfig::default();
        let (request, token) = InvokeArgs {
            arn: Some(ARN.to_string()),
            qualifier: Some("staging".to_string()),
            session_id: Some("abc".to_string()),
            bearer_token: Some("flag-token".to_string()),
            ..args(DEFAULT_PROMPT)
        }
        .into_request(&config)
        .unwrap();

        assert_eq!(request.agent_runtime_arn, ARN);
        assert_eq!(request.qualifier, "staging");
        assert_eq!(request.runtime_session_id.as_deref(), Some("abc"));
        assert_eq!(
            request.payload,
            json!({"prompt": "Hello, how is weather in Miami?"})
        );
        assert_eq!(token.as_deref(), Some("flag-token"));
    }

    #[test]
    fn test_request_falls_back_to_config() {
        let mut config = AppConfig::default();
        config.invoke.agent_runtime_arn = Some(ARN.to_string());
        config.invoke.bearer_token = Some("config-token".to_string());

        let (request, token) = args("Weather in Austin?").into_request(&config).unwrap();
        assert_eq!(request.agent_runtime_arn, ARN);
        assert_eq!(request.qualifier, "DEFAULT");
        assert_eq!(request.runtime_session_id, None);
        assert_eq!(token.as_deref(), Some("config-token"));
    }

    #[test]
    fn test_request_requires_arn() {
        let err = args("hi").into_request(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--arn"));
    }

    #[test]
    fn test_write_response() {
        let response = InvokeAgentRuntimeResponse {
            request_id: Some("req-1".to_string()),
            status_code: 200,
            trace_id: Some("Root=1-abc".to_string()),
            runtime_session_id: "session-9".to_string(),
            body: r#"{"result":{"role":"assistant","content":[{"text":"Sunny"}]}}"#.to_string(),
        };

        let mut out = Vec::new();
        write_response(&response, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("Full Response Metadata: {"));
        assert!(out.contains(r#""RequestId": "req-1""#));
        assert!(out.contains(r#""StatusCode": 200"#));
        assert!(out.contains(r#""TraceId": "Root=1-abc""#));
        assert!(out.contains(r#""SessionId": "session-9""#));
        assert!(out.ends_with(
            "\nAgent Response: {\"result\":{\"role\":\"assistant\",\"content\":[{\"text\":\"Sunny\"}]}}\n"
        ));
    }
}
