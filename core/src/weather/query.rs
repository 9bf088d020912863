//! Weather query processing with custom spans

use super::location::extract_location;
use crate::agent::Agent;
use crate::error::Result;
use tracing::field::{display, Empty};
use tracing::Instrument;

/// Run one weather query through `agent` inside a `weather_query_processing`
/// span and return the response text.
pub async fn process_weather_query(agent: &mut dyn Agent, user_input: &str) -> Result<String> {
    let span = tracing::info_span!(
        "weather_query_processing",
        query.location = Empty,
        "query.type" = Empty,
        response.success = Empty,
        response.length = Empty,
        "error.type" = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
    );

    async move {
        let span = tracing::Span::current();

        let location = extract_location(user_input);
        span.record("query.location", location);
        span.record("query.type", "weather_forecast");
        tracing::info!("query_analysis_complete");

        match agent.invoke(user_input).await {
            Ok(response) => {
                let text = response.to_string();
                span.record("response.success", true);
                span.record("response.length", text.chars().count());
                tracing::info!("weather_response_generated");
                span.record("otel.status_code", "OK");
                Ok(text)
            }
            Err(e) => {
                span.record("error.type", e.kind());
                tracing::error!(error = %e, "processing_error");
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", display(&e));
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}
