//! Traced interactive session
//!
//! The whole session runs under a `weather_agent_session` span and every
//! prompt shown to the user gets a `user_interaction` child span.

use super::chat::LoopExit;
use super::input::{is_exit_command, truncate_chars, Input, LineSource};
use anyhow::Result;
use console::style;
use std::io::Write;
use tracing::field::{display, Empty};
use tracing::Instrument;
use weather_agent_core::{process_weather_query, Agent};

/// Application name recorded on the session span
pub const APPLICATION_NAME: &str = "weather-agent";

/// Characters of the user query kept on the interaction span
const MAX_QUERY_ATTRIBUTE_CHARS: usize = 100;

/// Outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Prompts shown, including the one answered with `exit`
    pub total_queries: usize,
    pub exit: LoopExit,
}

fn write_banner(out: &mut impl Write, session_id: &str) -> Result<()> {
    writeln!(
        out,
        "\n{} (Session: {})\n",
        style("Weather Forecaster Agent").bold(),
        session_id
    )?;
    writeln!(out, "Ask about weather in any US city:")?;
    writeln!(out, "• 'What's the weather like in Seattle?'")?;
    writeln!(out, "• 'Will it rain tomorrow in Miami?'")?;
    writeln!(out, "• Type 'exit' to quit\n")?;
    Ok(())
}

/// Run the session loop until exit, interrupt or end of input
pub async fn run_session_loop<S, W>(
    agent: &mut dyn Agent,
    source: &mut S,
    out: &mut W,
    session_id: &str,
) -> Result<SessionSummary>
where
    S: LineSource + ?Sized,
    W: Write + Send,
{
    let session_span = tracing::info_span!(
        "weather_agent_session",
        application.name = APPLICATION_NAME,
        application.version = env!("CARGO_PKG_VERSION"),
        session.id = session_id,
        total.queries = Empty,
    );

    session_body(agent, source, out, session_id)
        .instrument(session_span)
        .await
}

async fn session_body<S, W>(
    agent: &mut dyn Agent,
    source: &mut S,
    out: &mut W,
    session_id: &str,
) -> Result<SessionSummary>
where
    S: LineSource + ?Sized,
    W: Write + Send,
{
    let session_span = tracing::Span::current();
    tracing::info!("session_started");
    write_banner(out, session_id)?;

    let mut query_count = 0;
    let exit = loop {
        query_count += 1;
        let span = interaction_span(query_count);
        match run_interaction(agent, source, out, query_count)
            .instrument(span)
            .await
        {
            Ok(Some(exit)) => break exit,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(parent: &session_span, error = %e, "session_error");
                writeln!(out, "\nError: {}", e)?;
            }
        }
    };

    if exit == LoopExit::Interrupted {
        tracing::info!("session_interrupted");
        writeln!(out, "\n\nSession interrupted. Exiting...")?;
    }

    session_span.record("total.queries", query_count);
    tracing::info!("session_completed");

    Ok(SessionSummary {
        total_queries: query_count,
        exit,
    })
}

fn interaction_span(number: usize) -> tracing::Span {
    tracing::info_span!(
        "user_interaction",
        interaction.number = number,
        user.query = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
    )
}

/// One prompt and its answer, run inside its `user_interaction` span.
/// `Ok(Some(_))` ends the session.
async fn run_interaction<S, W>(
    agent: &mut dyn Agent,
    source: &mut S,
    out: &mut W,
    number: usize,
) -> Result<Option<LoopExit>>
where
    S: LineSource + ?Sized,
    W: Write + Send,
{
    let span = tracing::Span::current();
    tracing::info!("user_prompt_displayed");
    write!(out, "Query #{} > ", number)?;
    out.flush()?;

    let line = match source.next_line().await {
        Input::Line(line) => line,
        Input::Interrupted => return Ok(Some(LoopExit::Interrupted)),
        Input::Eof => return Ok(Some(LoopExit::EndOfInput)),
    };

    if is_exit_command(&line) {
        tracing::info!("session_ended_by_user");
        writeln!(out, "\nGoodbye! 👋")?;
        return Ok(Some(LoopExit::UserExit));
    }

    span.record("user.query", truncate_chars(&line, MAX_QUERY_ATTRIBUTE_CHARS));
    tracing::info!("user_input_received");

    let result = tokio::select! {
        result = process_weather_query(agent, &line) => result,
        _ = source.wait_for_interrupt() => return Ok(Some(LoopExit::Interrupted)),
    };

    match result {
        Ok(response) => {
            writeln!(out, "\n{}\n", response)?;
            tracing::info!("response_delivered");
            span.record("otel.status_code", "OK");
            tracing::info!("Query {} processed successfully", number);
            Ok(None)
        }
        Err(e) => {
            span.record("otel.status_code", "ERROR");
            span.record("otel.status_message", display(&e));
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::input::testing::ScriptedLineSource;
    use async_trait::async_trait;
    use opentelemetry::trace::{Status, TracerProvider as _};
    use opentelemetry::Value;
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::layer::SubscriberExt;
    use weather_agent_core::agent::{AgentConfig, AgentResponse};
    use weather_agent_core::error::LlmError;
    use weather_agent_core::llm::LlmMessage;

    #[derive(Default)]
    struct CountingAgent {
        config: AgentConfig,
        calls: usize,
    }

    #[async_trait]
    impl Agent for CountingAgent {
        async fn invoke(&mut self, prompt: &str) -> weather_agent_core::Result<AgentResponse> {
            self.calls += 1;
            if prompt.starts_with("bad") {
                return Err(LlmError::InvalidRequest {
                    message: "unsupported location".to_string(),
                }
                .into());
            }
            Ok(AgentResponse::new(LlmMessage::assistant("Light rain, 58F")))
        }

        fn config(&self) -> &AgentConfig {
            &self.config
        }
    }

    fn setup_otel_test() -> (
        tracing::subscriber::DefaultGuard,
        InMemorySpanExporter,
        SdkTracerProvider,
    ) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let otel_layer = OpenTelemetryLayer::new(provider.tracer("test"));
        let subscriber = tracing_subscriber::registry::Registry::default().with(otel_layer);
        let guard = tracing::subscriber::set_default(subscriber);
        (guard, exporter, provider)
    }

    fn find_attribute<'a>(span: &'a SpanData, key: &str) -> Option<&'a Value> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    fn event_names(span: &SpanData) -> Vec<String> {
        span.events.iter().map(|e| e.name.to_string()).collect()
    }

    fn session_span(spans: &[SpanData]) -> &SpanData {
        spans
            .iter()
            .find(|s| s.name == "weather_agent_session")
            .expect("expected weather_agent_session span")
    }

    /// Interaction spans ordered by `interaction.number`
    fn interaction_spans(spans: &[SpanData]) -> Vec<&SpanData> {
        let mut interactions: Vec<&SpanData> = spans
            .iter()
            .filter(|s| s.name == "user_interaction")
            .collect();
        interactions.sort_by_key(|s| match find_attribute(s, "interaction.number") {
            Some(Value::I64(n)) => *n,
            other => panic!("interaction.number should be an integer, got {:?}", other),
        });
        interactions
    }

    async fn run(source: ScriptedLineSource) -> (SessionSummary, String, usize) {
        let mut agent = CountingAgent::default();
        let mut source = source;
        let mut out = Vec::new();
        let summary = run_session_loop(&mut agent, &mut source, &mut out, "session-42")
            .await
            .unwrap();
        (summary, String::from_utf8(out).unwrap(), agent.calls)
    }

    #[tokio::test]
    async fn test_session_counts_every_prompt() {
        let (summary, out, calls) = run(ScriptedLineSource::lines(&[
            "Weather in Seattle?",
            "Will it rain tomorrow in Miami?",
            "exit",
        ]))
        .await;

        assert_eq!(summary.exit, LoopExit::UserExit);
        assert_eq!(summary.total_queries, 3);
        assert_eq!(calls, 2);
        assert!(out.contains("(Session: session-42)"));
        assert!(out.contains("Query #1 > "));
        assert!(out.contains("Query #3 > "));
        assert!(out.contains("\nLight rain, 58F\n"));
        assert!(out.contains("\nGoodbye! 👋\n"));
    }

    #[tokio::test]
    async fn test_session_error_continues() {
        let (summary, out, calls) = run(ScriptedLineSource::lines(&[
            "bad query",
            "Weather in Boston",
        ]))
        .await;

        assert_eq!(summary.exit, LoopExit::EndOfInput);
        assert_eq!(summary.total_queries, 3);
        assert_eq!(calls, 2);
        assert!(out.contains("\nError: LLM error: Invalid request: unsupported location\n"));
        assert!(out.contains("Query #2 > "));
    }

    #[tokio::test]
    async fn test_session_interrupt() {
        let (summary, out, calls) = run(ScriptedLineSource::new(vec![
            Input::Line("Weather in Atlanta".to_string()),
            Input::Interrupted,
        ]))
        .await;

        assert_eq!(summary.exit, LoopExit::Interrupted);
        assert_eq!(summary.total_queries, 2);
        assert_eq!(calls, 1);
        assert!(out.ends_with("\n\nSession interrupted. Exiting...\n"));
    }

    #[tokio::test]
    async fn test_session_span_attributes_and_events() {
        let (_guard, exporter, _provider) = setup_otel_test();
        run(ScriptedLineSource::lines(&["Weather in Seattle?", "exit"])).await;

        let spans = exporter.get_finished_spans().unwrap();
        let session = session_span(&spans);
        assert_eq!(
            find_attribute(session, "application.name").map(|v| v.as_str().to_string()),
            Some("weather-agent".to_string())
        );
        assert_eq!(
            find_attribute(session, "application.version").map(|v| v.as_str().to_string()),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        assert_eq!(
            find_attribute(session, "session.id").map(|v| v.as_str().to_string()),
            Some("session-42".to_string())
        );
        assert_eq!(find_attribute(session, "total.queries"), Some(&Value::I64(2)));

        let events = event_names(session);
        assert_eq!(events.first().map(String::as_str), Some("session_started"));
        assert_eq!(events.last().map(String::as_str), Some("session_completed"));
        assert!(!events.iter().any(|e| e == "session_interrupted"));

        let interactions = interaction_spans(&spans);
        assert_eq!(interactions.len(), 2);
        assert!(interactions
            .iter()
            .all(|s| s.parent_span_id == session.span_context.span_id()));

        let answered = interactions[0];
        assert_eq!(
            find_attribute(answered, "user.query").map(|v| v.as_str().to_string()),
            Some("Weather in Seattle?".to_string())
        );
        assert_eq!(answered.status, Status::Ok);
        let events = event_names(answered);
        for expected in ["user_prompt_displayed", "user_input_received", "response_delivered"] {
            assert!(events.iter().any(|e| e == expected), "missing {}", expected);
        }

        let exited = interactions[1];
        assert!(find_attribute(exited, "user.query").is_none());
        assert!(event_names(exited).iter().any(|e| e == "session_ended_by_user"));
    }

    #[tokio::test]
    async fn test_failed_interaction_marks_span_error() {
        let (_guard, exporter, _provider) = setup_otel_test();
        run(ScriptedLineSource::lines(&["bad query", "exit"])).await;

        let spans = exporter.get_finished_spans().unwrap();
        let failed = interaction_spans(&spans)[0];
        match &failed.status {
            Status::Error { description } => {
                assert!(description.contains("unsupported location"))
            }
            other => panic!("expected error status, got {:?}", other),
        }
        assert!(!event_names(failed).iter().any(|e| e == "response_delivered"));

        let session = session_span(&spans);
        let error_event = session
            .events
            .iter()
            .find(|e| e.name == "session_error")
            .expect("expected session_error event");
        let error = error_event
            .attributes
            .iter()
            .find(|kv| kv.key.as_str() == "error")
            .expect("session_error should carry the error");
        assert!(error.value.as_str().contains("unsupported location"));
        assert_eq!(find_attribute(session, "total.queries"), Some(&Value::I64(2)));
    }

    #[tokio::test]
    async fn test_long_query_is_truncated_on_span() {
        let (_guard, exporter, _provider) = setup_otel_test();
        let query = "w".repeat(150);
        run(ScriptedLineSource::lines(&[query.as_str()])).await;

        let spans = exporter.get_finished_spans().unwrap();
        let interaction = interaction_spans(&spans)[0];
        let recorded = find_attribute(interaction, "user.query")
            .expect("expected user.query")
            .as_str()
            .to_string();
        assert_eq!(recorded, "w".repeat(100));
    }

    #[tokio::test]
    async fn test_interrupted_session_span() {
        let (_guard, exporter, _provider) = setup_otel_test();
        run(ScriptedLineSource::new(vec![
            Input::Line("Weather in Atlanta".to_string()),
            Input::Interrupted,
        ]))
        .await;

        let spans = exporter.get_finished_spans().unwrap();
        let session = session_span(&spans);
        let events = event_names(session);
        let interrupted = events.iter().position(|e| e == "session_interrupted");
        let completed = events.iter().position(|e| e == "session_completed");
        assert!(interrupted.is_some());
        assert!(interrupted < completed);
        assert_eq!(find_attribute(session, "total.queries"), Some(&Value::I64(2)));
    }
}
