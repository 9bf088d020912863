//! HTTP request tool

use crate::error::{Result, ToolError};
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

/// Bodies longer than this many characters are cut off
pub const MAX_BODY_CHARS: usize = 20_000;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"];
const DEFAULT_USER_AGENT: &str = concat!("weather-agent/", env!("CARGO_PKG_VERSION"));

/// Tool that lets the model call HTTP APIs such as api.weather.gov
pub struct HttpRequestTool {
    client: Client,
}

impl HttpRequestTool {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client)
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn parse_method(call: &ToolCall) -> Result<Method> {
        let method = call
            .get_optional_parameter::<String>("method")?
            .unwrap_or_else(|| "GET".to_string())
            .to_uppercase();

        if !ALLOWED_METHODS.contains(&method.as_str()) {
            return Err(ToolError::InvalidParameters {
                message: format!(
                    "Unsupported method '{}', expected one of {}",
                    method,
                    ALLOWED_METHODS.join(", ")
                ),
            }
            .into());
        }

        Method::from_bytes(method.as_bytes()).map_err(|e| {
            ToolError::InvalidParameters {
                message: e.to_string(),
            }
            .into()
        })
    }

    fn parse_url(call: &ToolCall) -> Result<url::Url> {
        let raw: String = call.get_parameter("url")?;
        let url = url::Url::parse(&raw).map_err(|e| ToolError::InvalidParameters {
            message: format!("Invalid url '{}': {}", raw, e),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ToolError::InvalidParameters {
                message: format!("Unsupported url scheme '{}'", scheme),
            }
            .into()),
        }
    }

    fn parse_headers(call: &ToolCall) -> Result<HeaderMap> {
        let raw = call
            .get_optional_parameter::<BTreeMap<String, String>>("headers")?
            .unwrap_or_default();

        let mut headers = HeaderMap::new();
        for (name, value) in raw {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                    ToolError::InvalidParameters {
                        message: format!("Invalid header name: {}", name),
                    }
                })?;
            let header_value =
                HeaderValue::from_str(&value).map_err(|_| ToolError::InvalidParameters {
                    message: format!("Invalid value for header: {}", name),
                })?;
            headers.insert(header_name, header_value);
        }

        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        }

        Ok(headers)
    }
}

impl Default for HttpRequestTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `body` to at most `max_chars` characters, noting how much was dropped
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!(
            "{}\n... [truncated {} characters]",
            &body[..cut],
            body[cut..].chars().count()
        ),
        None => body.to_string(),
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Make HTTP requests to external APIs and return the status code, response headers and body.\n\
         Use it to call REST APIs such as the National Weather Service API (https://api.weather.gov).\n\
         Supported methods: GET, POST, PUT, PATCH, DELETE, HEAD. Only http and https URLs are allowed.\n\
         A User-Agent header is sent automatically when none is provided."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "method": {
                    "type": "string",
                    "description": "HTTP method, defaults to GET",
                    "enum": ALLOWED_METHODS
                },
                "url": {
                    "type": "string",
                    "description": "The URL to send the request to"
                },
                "headers": {
                    "type": "object",
                    "description": "Request headers as string key/value pairs",
                    "additionalProperties": {"type": "string"}
                },
                "body": {
                    "type": "string",
                    "description": "Request body for POST, PUT and PATCH requests"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let method = Self::parse_method(&call)?;
        let url = Self::parse_url(&call)?;
        let headers = Self::parse_headers(&call)?;
        let body: Option<String> = call.get_optional_parameter("body")?;

        tracing::debug!(method = %method, url = %url, "Sending HTTP request");

        let mut request = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            message: format!("Request to {} failed: {}", url, e),
        })?;

        let status = response.status();
        let response_headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response.text().await.map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;

        let content = format!(
            "Status Code: {}\n\nHeaders: {}\n\nBody: {}",
            status,
            serde_json::to_string(&response_headers).unwrap_or_default(),
            truncate_body(&body, MAX_BODY_CHARS)
        );

        Ok(ToolResult::success(call.id, content))
    }
}

impl_tool_factory!(
    HttpRequestToolFactory,
    HttpRequestTool,
    "http_request",
    "Make HTTP requests to external APIs"
);
