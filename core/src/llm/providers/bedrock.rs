//! Amazon Bedrock client implementation (Converse API)

use crate::config::ModelConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Bedrock runtime client speaking the Converse API
pub struct BedrockClient {
    client: Client,
    bearer_token: String,
    endpoint: String,
    model_config: ModelConfig,
}

impl BedrockClient {
    /// Create a new Bedrock client
    pub fn new(model_config: &ModelConfig) -> Result<Self> {
        let bearer_token = model_config
            .bearer_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| LlmError::Authentication {
                message: "No Bedrock API key found (set AWS_BEARER_TOKEN_BEDROCK)".to_string(),
            })?;

        Ok(Self {
            client: Client::new(),
            bearer_token,
            endpoint: model_config.resolved_endpoint(),
            model_config: model_config.clone(),
        })
    }

    fn converse_url(&self) -> String {
        let model_id: String =
            url::form_urlencoded::byte_serialize(self.model_config.model_id.as_bytes()).collect();
        format!("{}/model/{}/converse", self.endpoint, model_id)
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> ConverseRequest {
        let options = options.unwrap_or_default();
        let params = &self.model_config.params;

        let mut system = Vec::new();
        let mut conversation: Vec<ConverseMessage> = Vec::new();

        for message in &messages {
            if message.role == MessageRole::System {
                if let Some(text) = message.get_text() {
                    system.push(SystemBlock { text });
                }
                continue;
            }

            let converted = ConverseMessage::from(message);
            if converted.content.is_empty() {
                continue;
            }
            // Converse requires alternating roles
            match conversation.last_mut() {
                Some(last) if last.role == converted.role => last.content.extend(converted.content),
                _ => conversation.push(converted),
            }
        }

        let inference_config = InferenceConfig {
            max_tokens: options.max_tokens.or(params.max_tokens),
            temperature: options.temperature.or(params.temperature),
            top_p: options.top_p.or(params.top_p),
            stop_sequences: options.stop.or_else(|| params.stop_sequences.clone()),
        };

        let tool_config = tools.filter(|t| !t.is_empty()).map(|tools| ToolConfig {
            tools: tools
                .into_iter()
                .map(|tool| ToolEntry {
                    tool_spec: ToolSpec {
                        name: tool.name,
                        description: tool.description,
                        input_schema: InputSchema {
                            json: tool.parameters,
                        },
                    },
                })
                .collect(),
        });

        ConverseRequest {
            messages: conversation,
            system,
            inference_config: (!inference_config.is_empty()).then_some(inference_config),
            tool_config,
        }
    }

    fn convert_response(&self, response: ConverseResponse) -> LlmResponse {
        let blocks: Vec<ContentBlock> = response
            .output
            .message
            .content
            .into_iter()
            .filter_map(ConverseContentBlock::into_content_block)
            .collect();

        let content = match blocks.as_slice() {
            [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
            _ => MessageContent::Blocks(blocks),
        };

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = match response.stop_reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            "tool_use" => FinishReason::ToolCalls,
            "content_filtered" | "guardrail_intervened" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        };

        LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
            },
            usage,
            model: self.model_config.model_id.clone(),
            finish_reason: Some(finish_reason),
        }
    }
}

#[async_trait]
impl LlmClient for BedrockClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options);
        tracing::debug!(
            model = %self.model_config.model_id,
            messages = request.messages.len(),
            "Sending Converse request"
        );

        let response = self
            .client
            .post(self.converse_url())
            .bearer_auth(&self.bearer_token)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication {
                    message: error_text,
                },
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimit,
                _ => LlmError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                },
            };
            return Err(err.into());
        }

        let converse_response: ConverseResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: format!("Failed to parse Converse response: {}", e),
                })?;

        Ok(self.convert_response(converse_response))
    }

    fn model_name(&self) -> &str {
        &self.model_config.model_id
    }

    fn provider_name(&self) -> &str {
        "aws.bedrock"
    }
}

/// Render a message the way the Converse API represents it:
/// `{"role": "...", "content": [{"text": "..."}, ...]}`
pub fn converse_message_json(message: &LlmMessage) -> serde_json::Value {
    serde_json::to_value(ConverseMessage::from(message)).unwrap_or_default()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest {
    messages: Vec<ConverseMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inference_config: Option<InferenceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Debug, Serialize)]
struct SystemBlock {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

impl InferenceConfig {
    fn is_empty(&self) -> bool {
        self.max_tokens.is_none()
            && self.temperature.is_none()
            && self.top_p.is_none()
            && self.stop_sequences.is_none()
    }
}

#[derive(Debug, Serialize)]
struct ToolConfig {
    tools: Vec<ToolEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolEntry {
    tool_spec: ToolSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSpec {
    name: String,
    description: String,
    input_schema: InputSchema,
}

#[derive(Debug, Serialize)]
struct InputSchema {
    json: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConverseMessage {
    role: String,
    content: Vec<ConverseContentBlock>,
}

impl From<&LlmMessage> for ConverseMessage {
    fn from(message: &LlmMessage) -> Self {
        // Tool results travel back to the model as a user turn
        let role = match message.role {
            MessageRole::Assistant => "assistant",
            MessageRole::User | MessageRole::Tool | MessageRole::System => "user",
        };

        let content = match &message.content {
            MessageContent::Text(text) => vec![ConverseContentBlock::text(text)],
            MessageContent::Blocks(blocks) => {
                blocks.iter().map(ConverseContentBlock::from).collect()
            }
        };

        Self {
            role: role.to_string(),
            content: content
                .into_iter()
                .filter(|block| !block.is_blank_text())
                .collect(),
        }
    }
}

/// One Converse content block; exactly one field is set
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseContentBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_use: Option<ConverseToolUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_result: Option<ConverseToolResult>,
}

impl ConverseContentBlock {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn is_blank_text(&self) -> bool {
        matches!(&self.text, Some(text) if text.trim().is_empty())
    }

    fn into_content_block(self) -> Option<ContentBlock> {
        if let Some(text) = self.text {
            return Some(ContentBlock::Text { text });
        }
        if let Some(tool_use) = self.tool_use {
            return Some(ContentBlock::ToolUse {
                id: tool_use.tool_use_id,
                name: tool_use.name,
                input: tool_use.input,
            });
        }
        if let Some(tool_result) = self.tool_result {
            return Some(ContentBlock::ToolResult {
                tool_use_id: tool_result.tool_use_id,
                is_error: tool_result.status.as_deref() == Some("error"),
                content: tool_result
                    .content
                    .into_iter()
                    .filter_map(|c| c.text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            });
        }
        None
    }
}

impl From<&ContentBlock> for ConverseContentBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Self::text(text),
            ContentBlock::ToolUse { id, name, input } => Self {
                tool_use: Some(ConverseToolUse {
                    tool_use_id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                ..Default::default()
            },
            ContentBlock::ToolResult {
                tool_use_id,
                is_error,
                content,
            } => Self {
                tool_result: Some(ConverseToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: vec![ToolResultContent {
                        text: Some(content.clone()),
                    }],
                    status: Some(if *is_error { "error" } else { "success" }.to_string()),
                }),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseToolUse {
    tool_use_id: String,
    name: String,
    #[serde(default)]
    input: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseToolResult {
    tool_use_id: String,
    #[serde(default)]
    content: Vec<ToolResultContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ToolResultContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    stop_reason: String,
    usage: Option<ConverseUsage>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: ConverseMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}
