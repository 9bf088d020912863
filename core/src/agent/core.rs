//! AgentCore implementation

use super::config::AgentConfig;
use crate::agent::{Agent, AgentResponse, AgentResult};
use crate::error::{AgentError, Result};
use crate::llm::{ChatOptions, ContentBlock, LlmClient, LlmMessage, MessageRole, Usage};
use crate::telemetry::current_trace_id;
use crate::tools::{ToolCall, ToolExecutor};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::field::{display, Empty};
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of one event loop cycle
enum CycleOutcome {
    /// Tools ran; the model needs another turn
    Continue,
    /// The model answered without tool use
    Finished(AgentResponse),
}

/// Weather agent: a model with tools and a persistent conversation
pub struct AgentCore {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
    chat_options: ChatOptions,
    conversation_history: Vec<LlmMessage>,
}

impl AgentCore {
    pub fn new(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        tool_executor: ToolExecutor,
        chat_options: ChatOptions,
    ) -> Self {
        Self {
            config,
            llm_client,
            tool_executor,
            chat_options,
            conversation_history: Vec::new(),
        }
    }

    /// Conversation so far, without the system prompt
    pub fn history(&self) -> &[LlmMessage] {
        &self.conversation_history
    }

    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }

    /// Names of the tools the model can call
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_executor.list_tools()
    }

    /// Append a finished turn, then drop the oldest turns beyond `window_size`
    fn commit_turn(&mut self, turn: Vec<LlmMessage>) {
        self.conversation_history.extend(turn);

        let window = self.config.window_size;
        let len = self.conversation_history.len();
        if window == 0 || len <= window {
            return;
        }

        // Cut only where a user prompt starts a turn so tool uses keep their results.
        // A single turn longer than the window is kept whole.
        let is_turn_start = |message: &LlmMessage| message.role == MessageRole::User;
        let start = (len - window..len)
            .find(|&i| is_turn_start(&self.conversation_history[i]))
            .or_else(|| self.conversation_history.iter().rposition(is_turn_start))
            .unwrap_or(0);

        if start > 0 {
            tracing::debug!("Dropping {} message(s) outside the conversation window", start);
            self.conversation_history.drain(..start);
        }
    }

    /// History changes only once the turn finishes
    async fn run_event_loop(&mut self, prompt: &str) -> Result<AgentResponse> {
        let mut turn = vec![LlmMessage::user(prompt)];

        let mut usage = Usage::default();
        for cycle in 1..=self.config.max_cycles {
            let cycle_span = tracing::info_span!(
                "execute_event_loop_cycle",
                event_loop.cycle_id = %Uuid::new_v4(),
                event_loop.cycle = cycle,
                otel.status_code = Empty,
                otel.status_message = Empty,
            );

            match self
                .run_cycle(&mut turn, &mut usage)
                .instrument(cycle_span.clone())
                .await
            {
                Ok(CycleOutcome::Continue) => {
                    cycle_span.record("otel.status_code", "OK");
                }
                Ok(CycleOutcome::Finished(mut response)) => {
                    cycle_span.record("otel.status_code", "OK");
                    response.usage = usage;
                    response.cycles = cycle;
                    response.trace_id = current_trace_id();
                    self.commit_turn(turn);
                    return Ok(response);
                }
                Err(e) => {
                    cycle_span.record("otel.status_code", "ERROR");
                    cycle_span.record("otel.status_message", display(&e));
                    return Err(e);
                }
            }
        }

        Err(AgentError::MaxCyclesExceeded {
            max_cycles: self.config.max_cycles,
        }
        .into())
    }

    async fn run_cycle(
        &self,
        turn: &mut Vec<LlmMessage>,
        usage: &mut Usage,
    ) -> Result<CycleOutcome> {
        let mut messages = Vec::with_capacity(self.conversation_history.len() + turn.len() + 1);
        messages.push(LlmMessage::system(self.config.effective_system_prompt()));
        messages.extend(self.conversation_history.iter().cloned());
        messages.extend(turn.iter().cloned());

        let tool_definitions = self.tool_executor.get_tool_definitions();

        let chat_span = tracing::info_span!(
            "chat",
            gen_ai.operation.name = "chat",
            gen_ai.system = %self.llm_client.provider_name(),
            gen_ai.request.model = %self.llm_client.model_name(),
            gen_ai.usage.input_tokens = Empty,
            gen_ai.usage.output_tokens = Empty,
            gen_ai.response.finish_reason = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );

        let response = match self
            .llm_client
            .chat_completion(
                messages,
                Some(tool_definitions),
                Some(self.chat_options.clone()),
            )
            .instrument(chat_span.clone())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Model request failed: {}", e);
                chat_span.record("otel.status_code", "ERROR");
                chat_span.record("otel.status_message", display(&e));
                return Err(e);
            }
        };

        if let Some(call_usage) = &response.usage {
            chat_span.record("gen_ai.usage.input_tokens", call_usage.prompt_tokens);
            chat_span.record("gen_ai.usage.output_tokens", call_usage.completion_tokens);
            usage.accumulate(call_usage);
        }
        if let Some(reason) = &response.finish_reason {
            chat_span.record("gen_ai.response.finish_reason", reason.as_str());
        }
        chat_span.record("otel.status_code", "OK");

        turn.push(response.message.clone());

        if !response.message.has_tool_use() {
            return Ok(CycleOutcome::Finished(AgentResponse {
                message: response.message,
                finish_reason: response.finish_reason,
                usage: Usage::default(),
                cycles: 0,
                trace_id: None,
            }));
        }

        let tool_calls: Vec<ToolCall> = response
            .message
            .get_tool_uses()
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    parameters: input.clone(),
                }),
                _ => None,
            })
            .collect();

        tracing::debug!("Model requested {} tool call(s)", tool_calls.len());

        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            let tool_span = tracing::info_span!(
                "execute_tool",
                gen_ai.operation.name = "execute_tool",
                gen_ai.tool.name = %call.name,
                gen_ai.tool.call.id = %call.id,
                tool.status = Empty,
                tool.duration_ms = Empty,
                otel.status_code = Empty,
            );

            let tool_use_id = call.id.clone();
            let tool_name = call.name.clone();
            let result = self
                .tool_executor
                .execute(call)
                .instrument(tool_span.clone())
                .await;

            if let Some(duration_ms) = result.duration_ms {
                tool_span.record("tool.duration_ms", duration_ms);
            }
            if result.success {
                tool_span.record("tool.status", "success");
                tool_span.record("otel.status_code", "OK");
            } else {
                tool_span.record("tool.status", "error");
                tool_span.record("otel.status_code", "ERROR");
                tracing::warn!(parent: &tool_span, "Tool {} failed: {}", tool_name, result.content);
            }

            results.push(ContentBlock::ToolResult {
                tool_use_id,
                is_error: !result.success,
                content: result.content,
            });
        }

        turn.push(LlmMessage::tool_results(results));

        Ok(CycleOutcome::Continue)
    }
}

#[async_trait]
impl Agent for AgentCore {
    async fn invoke(&mut self, prompt: &str) -> AgentResult<AgentResponse> {
        if prompt.trim().is_empty() {
            return Err(AgentError::InvalidInput {
                message: "prompt must not be empty".to_string(),
            }
            .into());
        }

        let span = tracing::info_span!(
            "invoke_agent",
            gen_ai.operation.name = "invoke_agent",
            gen_ai.system = %self.llm_client.provider_name(),
            gen_ai.agent.name = %self.config.name,
            gen_ai.request.model = %self.llm_client.model_name(),
            gen_ai.usage.input_tokens = Empty,
            gen_ai.usage.output_tokens = Empty,
            gen_ai.usage.total_tokens = Empty,
            event_loop.cycles = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );
        self.config.trace_attributes.apply_to(&span);

        let result = self.run_event_loop(prompt).instrument(span.clone()).await;

        match &result {
            Ok(response) => {
                span.record("gen_ai.usage.input_tokens", response.usage.prompt_tokens);
                span.record("gen_ai.usage.output_tokens", response.usage.completion_tokens);
                span.record("gen_ai.usage.total_tokens", response.usage.total_tokens);
                span.record("event_loop.cycles", response.cycles);
                span.record("otel.status_code", "OK");
            }
            Err(e) => {
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", display(e));
            }
        }

        result
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn reset(&mut self) {
        self.clear_history();
    }
}
