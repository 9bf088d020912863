//! Session identifiers carried in OpenTelemetry baggage

use opentelemetry::baggage::BaggageExt;
use opentelemetry::{Context, ContextGuard, KeyValue};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

/// Baggage and attribute key for the session identifier
pub const SESSION_ID_KEY: &str = "session.id";

/// A session identifier that can be attached to the telemetry context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    id: String,
}

impl SessionContext {
    /// Create a session with a random id
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a session with a known id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current context with `session.id` added to its baggage
    pub fn context(&self) -> Context {
        Context::current_with_baggage(vec![KeyValue::new(SESSION_ID_KEY, self.id.clone())])
    }

    /// Make this session the current context until the guard is dropped
    pub fn attach(&self) -> SessionGuard {
        let guard = self.context().attach();
        tracing::info!("Session ID '{}' attached to telemetry context", self.id);
        SessionGuard {
            id: self.id.clone(),
            _guard: guard,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Detaches the session context on drop
pub struct SessionGuard {
    id: String,
    _guard: ContextGuard,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::info!("Session context for '{}' detached", self.id);
    }
}

/// Session id from the current span's context, else the attached context
pub fn current_session_id() -> Option<String> {
    let span_context = tracing::Span::current().context();
    if let Some(value) = span_context.baggage().get(SESSION_ID_KEY) {
        return Some(value.to_string());
    }

    Context::current()
        .baggage()
        .get(SESSION_ID_KEY)
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_ids_are_unique_uuids() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a, b);
        assert_eq!(a.id().len(), 36);
        assert!(Uuid::parse_str(a.id()).is_ok());
    }

    #[test]
    fn test_attach_and_detach() {
        assert_eq!(current_session_id(), None);

        let session = SessionContext::with_id("session-under-test");
        {
            let _guard = session.attach();
            assert_eq!(current_session_id().as_deref(), Some("session-under-test"));
        }

        assert_eq!(current_session_id(), None);
    }
}
