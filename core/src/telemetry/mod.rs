//! Tracing and OpenTelemetry wiring
//!
//! Spans are written with `tracing` and exported through
//! `tracing-opentelemetry`. Span status is set with the `otel.status_code`
//! and `otel.status_message` fields; events inside a span become span events
//! named after their message.

pub mod attributes;
pub mod propagation;
pub mod session;

pub use propagation::{extract_context, inject_current_context};
pub use session::{current_session_id, SessionContext, SessionGuard, SESSION_ID_KEY};

use crate::config::TelemetryConfig;
use crate::error::{Error, Result};
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::{TraceContextExt, TracerProvider as _};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Instrumentation scope name for spans created by this crate
pub const TRACER_NAME: &str = "weather-agent";

/// Flushes and shuts down the tracer provider when dropped
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!("Failed to shut down tracer provider: {}", e);
        }
    }
}

/// Normalize an OTLP base endpoint to the traces signal path
pub fn traces_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.ends_with("/v1/traces") {
        endpoint.to_string()
    } else {
        format!("{}/v1/traces", endpoint)
    }
}

/// Build the tracer provider; spans are exported over OTLP/HTTP only when an
/// endpoint is configured
pub fn build_tracer_provider(config: &TelemetryConfig) -> Result<SdkTracerProvider> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(
            "service.version",
            config.service_version.clone(),
        ))
        .build();

    let mut builder = SdkTracerProvider::builder().with_resource(resource);

    if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(traces_endpoint(endpoint))
            .build()
            .map_err(|e| Error::Telemetry {
                message: format!("Failed to build OTLP exporter: {}", e),
            })?;
        builder = builder.with_batch_exporter(exporter);
    }

    Ok(builder.build())
}

/// Install the global subscriber, tracer provider and propagators
pub fn init_telemetry(config: &TelemetryConfig, verbose: bool) -> Result<TelemetryGuard> {
    let provider = build_tracer_provider(config)?;
    let tracer = provider.tracer(TRACER_NAME);

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|e| Error::Telemetry {
            message: format!("Failed to install tracing subscriber: {}", e),
        })?;

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::debug!(endpoint = %traces_endpoint(endpoint), "Exporting spans over OTLP");
    }

    Ok(TelemetryGuard { provider })
}

/// Hex trace id of the current span, for trace-to-log correlation
pub fn current_trace_id() -> Option<String> {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}
