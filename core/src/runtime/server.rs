//! Agent runtime HTTP service
//!
//! Axum server speaking the agent runtime contract. Each endpoint has a thin
//! axum handler that delegates to an inner function returning a status code
//! and JSON body.
//!
//! Endpoints:
//! - POST /invocations  run the agent on `{"prompt": ...}`
//! - GET  /ping         health check
//!
//! One process hosts one agent conversation. The runtime gives every session
//! its own instance, so a request carrying a different session id than the
//! one the agent is bound to resets the conversation first.

use super::entrypoint::handle_invocation;
use crate::agent::Agent;
use crate::config::RuntimeConfig;
use crate::error::{AgentError, Error, Result};
use crate::telemetry::{extract_context, SESSION_ID_KEY};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use opentelemetry::baggage::BaggageExt;
use opentelemetry::KeyValue;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::field::{display, Empty};
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header carrying the runtime session id
pub const SESSION_HEADER: &str = "x-amzn-bedrock-agentcore-runtime-session-id";

/// Agent plus the session its conversation belongs to
struct HostedAgent {
    agent: Box<dyn Agent>,
    session_id: Option<String>,
}

impl HostedAgent {
    /// Reset the conversation when `session_id` names another session
    fn bind_session(&mut self, session_id: Option<&str>) {
        let Some(id) = session_id else {
            return;
        };
        match self.session_id.as_deref() {
            Some(current) if current == id => {}
            Some(current) => {
                tracing::info!("Session changed from {} to {}, resetting conversation", current, id);
                self.agent.reset();
                self.session_id = Some(id.to_string());
            }
            None => self.session_id = Some(id.to_string()),
        }
    }
}

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct RuntimeState {
    hosted: Arc<Mutex<HostedAgent>>,
    last_update: Arc<AtomicI64>,
}

impl RuntimeState {
    pub fn new(agent: Box<dyn Agent>) -> Self {
        Self {
            hosted: Arc::new(Mutex::new(HostedAgent {
                agent,
                session_id: None,
            })),
            last_update: Arc::new(AtomicI64::new(chrono::Utc::now().timestamp())),
        }
    }

    /// Unix seconds of the last change between idle and busy
    pub fn time_of_last_update(&self) -> i64 {
        self.last_update.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        self.last_update
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: RuntimeState) -> Router {
    Router::new()
        .route("/invocations", post(invocations_handler))
        .route("/ping", get(ping_handler))
        .with_state(state)
}

/// Serve the runtime on the configured address until `shutdown` resolves
pub async fn serve(
    agent: Box<dyn Agent>,
    config: &RuntimeConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = config.bind_addr();
    let app = build_router(RuntimeState::new(agent));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Agent runtime listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Agent runtime shutting down...");
        })
        .await?;

    Ok(())
}

async fn invocations_handler(
    State(state): State<RuntimeState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let (status, body) = invocations_inner(&state, &headers, &payload).await;
    (status, Json(body))
}

async fn ping_handler(State(state): State<RuntimeState>) -> impl IntoResponse {
    let (status, body) = ping_inner(&state);
    (status, Json(body))
}

/// Run one invocation under an `invocation` span parented on the incoming
/// trace context
pub async fn invocations_inner(
    state: &RuntimeState,
    headers: &HeaderMap,
    payload: &Value,
) -> (StatusCode, Value) {
    let mut parent = extract_context(headers);
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            parent
                .baggage()
                .get(SESSION_ID_KEY)
                .map(|value| value.to_string())
        });

    let span = tracing::info_span!(
        "invocation",
        session.id = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
    );
    if let Some(id) = &session_id {
        parent = parent.with_baggage(vec![KeyValue::new(SESSION_ID_KEY, id.clone())]);
        span.record("session.id", id.as_str());
    }
    span.set_parent(parent);

    async move {
        let span = tracing::Span::current();

        state.touch();
        let result = {
            let mut hosted = state.hosted.lock().await;
            hosted.bind_session(session_id.as_deref());
            handle_invocation(hosted.agent.as_mut(), payload).await
        };
        state.touch();

        match result {
            Ok(body) => {
                span.record("otel.status_code", "OK");
                (StatusCode::OK, body)
            }
            Err(e @ (Error::Runtime(_) | Error::Agent(AgentError::InvalidInput { .. }))) => {
                tracing::warn!("Rejected invocation: {}", e);
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", display(&e));
                (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
            }
            Err(e) => {
                tracing::error!("Invocation failed: {}", e);
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", display(&e));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                )
            }
        }
    }
    .instrument(span)
    .await
}

/// `Healthy` when idle, `HealthyBusy` while an invocation holds the agent
pub fn ping_inner(state: &RuntimeState) -> (StatusCode, Value) {
    let status = if state.hosted.try_lock().is_ok() {
        "Healthy"
    } else {
        "HealthyBusy"
    };

    (
        StatusCode::OK,
        json!({
            "status": status,
            "time_of_last_update": state.time_of_last_update(),
        }),
    )
}
