//! Agent runtime invocation over HTTPS

use crate::config::InvokeConfig;
use crate::error::{InvocationError, Result};
use crate::runtime::SESSION_HEADER;
use crate::telemetry::inject_current_context;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::field::Empty;
use tracing::Instrument;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-amzn-requestid";
const TRACE_ID_HEADER: &str = "x-amzn-trace-id";

/// One call to a deployed agent runtime
#[derive(Debug, Clone)]
pub struct InvokeAgentRuntimeRequest {
    pub agent_runtime_arn: String,
    pub qualifier: String,
    pub payload: Value,
    /// Generated when absent
    pub runtime_session_id: Option<String>,
}

impl InvokeAgentRuntimeRequest {
    pub fn new(agent_runtime_arn: impl Into<String>, payload: Value) -> Self {
        Self {
            agent_runtime_arn: agent_runtime_arn.into(),
            qualifier: "DEFAULT".to_string(),
            payload,
            runtime_session_id: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.runtime_session_id = Some(session_id.into());
        self
    }
}

/// Response from a deployed agent runtime
#[derive(Debug, Clone)]
pub struct InvokeAgentRuntimeResponse {
    pub request_id: Option<String>,
    pub status_code: u16,
    pub trace_id: Option<String>,
    pub runtime_session_id: String,
    /// Full response body
    pub body: String,
}

impl InvokeAgentRuntimeResponse {
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            request_id: self.request_id.clone(),
            status_code: self.status_code,
            trace_id: self.trace_id.clone(),
            session_id: self.runtime_session_id.clone(),
        }
    }
}

/// Identifiers worth printing after an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseMetadata {
    pub request_id: Option<String>,
    pub status_code: u16,
    pub trace_id: Option<String>,
    pub session_id: String,
}

/// Client for the agent runtime data plane
pub struct AgentRuntimeClient {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl AgentRuntimeClient {
    pub fn new(config: &InvokeConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.resolved_endpoint(),
            bearer_token: config.bearer_token.clone().filter(|t| !t.is_empty()),
        }
    }

    /// `{endpoint}/runtimes/{arn}/invocations?qualifier=...` with the ARN
    /// percent-encoded as one path segment
    pub fn invocation_url(&self, agent_runtime_arn: &str, qualifier: &str) -> Result<url::Url> {
        let encoded_arn: String =
            url::form_urlencoded::byte_serialize(agent_runtime_arn.as_bytes()).collect();
        let mut url = url::Url::parse(&format!(
            "{}/runtimes/{}/invocations",
            self.endpoint, encoded_arn
        ))
        .map_err(|e| crate::error::ConfigError::InvalidValue {
            field: "invoke.endpoint".to_string(),
            value: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("qualifier", qualifier);
        Ok(url)
    }

    /// Send `request.payload` to the runtime and read the whole response
    pub async fn invoke_agent_runtime(
        &self,
        request: InvokeAgentRuntimeRequest,
    ) -> Result<InvokeAgentRuntimeResponse> {
        let session_id = request
            .runtime_session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = tracing::info_span!(
            "invoke_agent_runtime",
            agent.runtime.arn = %request.agent_runtime_arn,
            agent.runtime.qualifier = %request.qualifier,
            session.id = %session_id,
            http.response.status_code = Empty,
            otel.status_code = Empty,
        );

        self.send(&request, session_id).instrument(span).await
    }

    async fn send(
        &self,
        request: &InvokeAgentRuntimeRequest,
        session_id: String,
    ) -> Result<InvokeAgentRuntimeResponse> {
        let url = self.invocation_url(&request.agent_runtime_arn, &request.qualifier)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            headers.insert(SESSION_HEADER, value);
        }
        inject_current_context(&mut headers);

        let mut builder = self.client.post(url).headers(headers).json(&request.payload);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!("Invoking agent runtime {}", request.agent_runtime_arn);
        let response = builder.send().await?;

        let status = response.status();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let request_id = header(REQUEST_ID_HEADER);
        let trace_id = header(TRACE_ID_HEADER);
        let runtime_session_id = header(SESSION_HEADER).unwrap_or(session_id);

        let bytes = response.bytes().await?;
        let body = String::from_utf8(bytes.to_vec()).map_err(|_| InvocationError::InvalidBody)?;

        let span = tracing::Span::current();
        span.record("http.response.status_code", status.as_u16());

        if !status.is_success() {
            span.record("otel.status_code", "ERROR");
            return Err(InvocationError::Status {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }
        span.record("otel.status_code", "OK");

        Ok(InvokeAgentRuntimeResponse {
            request_id,
            status_code: status.as_u16(),
            trace_id,
            runtime_session_id,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARN: &str = "arn:aws:bedrock-agentcore:us-east-1:123456789012:runtime/weather_agent-abc123";

    fn client_for(server: &MockServer, token: Option<&str>) -> AgentRuntimeClient {
        let config = InvokeConfig {
            endpoint: Some(server.uri()),
            bearer_token: token.map(str::to_string),
            ..InvokeConfig::default()
        };
        AgentRuntimeClient::new(&config)
    }

    #[test]
    fn test_invocation_url_encodes_arn() {
        let client = AgentRuntimeClient::new(&InvokeConfig::default());
        let url = client.invocation_url(ARN, "DEFAULT").unwrap();
        assert_eq!(
            url.as_str(),
            "https://bedrock-agentcore.us-east-1.amazonaws.com/runtimes/\
             arn%3Aaws%3Abedrock-agentcore%3Aus-east-1%3A123456789012%3Aruntime%2Fweather_agent-abc123\
             /invocations?qualifier=DEFAULT"
        );
    }

    #[tokio::test]
    async fn test_invoke_returns_metadata_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/runtimes/.+/invocations$"))
            .and(query_param("qualifier", "DEFAULT"))
            .and(header("authorization", "Bearer token-123"))
            .and(header("x-amzn-bedrock-agentcore-runtime-session-id", "session-0001"))
            .and(body_json(json!({"prompt": "Hello, how is weather in Miami?"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-amzn-requestid", "req-42")
                    .insert_header("x-amzn-trace-id", "Root=1-abc")
                    .insert_header("x-amzn-bedrock-agentcore-runtime-session-id", "session-0001")
                    .set_body_string(r#"{"result":{"role":"assistant","content":[{"text":"Sunny"}]}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("token-123"));
        let request = InvokeAgentRuntimeRequest::new(
            ARN,
            json!({"prompt": "Hello, how is weather in Miami?"}),
        )
        .with_session_id("session-0001");

        let response = client.invoke_agent_runtime(request).await.unwrap();

        assert_eq!(
            response.metadata(),
            ResponseMetadata {
                request_id: Some("req-42".to_string()),
                status_code: 200,
                trace_id: Some("Root=1-abc".to_string()),
                session_id: "session-0001".to_string(),
            }
        );
        assert!(response.body.contains("Sunny"));

        let printed = serde_json::to_value(response.metadata()).unwrap();
        assert_eq!(printed["RequestId"], "req-42");
        assert_eq!(printed["StatusCode"], 200);
        assert_eq!(printed["SessionId"], "session-0001");
    }

    #[tokio::test]
    async fn test_generates_session_id_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("x-amzn-bedrock-agentcore-runtime-session-id"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let response = client
            .invoke_agent_runtime(InvokeAgentRuntimeRequest::new(ARN, json!({"prompt": "hi"})))
            .await
            .unwrap();

        // No session header in the response, so the sent id is reported
        assert_eq!(response.runtime_session_id.len(), 36);
        assert_eq!(response.request_id, None);
    }

    #[tokio::test]
    async fn test_error_status_is_an_invocation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Access denied"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("bad-token"));
        let err = client
            .invoke_agent_runtime(InvokeAgentRuntimeRequest::new(ARN, json!({"prompt": "hi"})))
            .await
            .unwrap_err();

        match err {
            Error::Invocation(InvocationError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Access denied");
            }
            other => panic!("expected invocation error, got {:?}", other),
        }
    }
}
