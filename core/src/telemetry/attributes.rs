//! Custom trace attributes for agent spans

use crate::config::TraceAttributes;
use crate::telemetry::session::{current_session_id, SESSION_ID_KEY};
use opentelemetry::{Array, KeyValue, StringValue, Value};
use tracing_opentelemetry::OpenTelemetrySpanExt;

impl TraceAttributes {
    /// Attributes as OpenTelemetry key/values; `tags` is a string array
    pub fn to_key_values(&self) -> Vec<KeyValue> {
        let mut attributes = Vec::with_capacity(4);

        if let Some(session_id) = &self.session_id {
            attributes.push(KeyValue::new(SESSION_ID_KEY, session_id.clone()));
        }
        attributes.push(KeyValue::new("user.email", self.user_email.clone()));
        attributes.push(KeyValue::new("user.id", self.user_id.clone()));
        attributes.push(KeyValue::new(
            "tags",
            Value::Array(Array::String(
                self.tags.iter().cloned().map(StringValue::from).collect(),
            )),
        ));

        attributes
    }

    /// Set every attribute on `span`.
    ///
    /// Without a configured session id the one in baggage is used.
    pub fn apply_to(&self, span: &tracing::Span) {
        let resolved;
        let attributes = if self.session_id.is_none() {
            resolved = Self {
                session_id: current_session_id(),
                ..self.clone()
            };
            &resolved
        } else {
            self
        };

        for kv in attributes.to_key_values() {
            span.set_attribute(kv.key, kv.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_values() {
        let attributes = TraceAttributes::default();
        let kvs = attributes.to_key_values();

        assert_eq!(kvs.len(), 3);
        assert_eq!(kvs[0], KeyValue::new("user.email", "demo@example.com"));
        assert_eq!(kvs[1], KeyValue::new("user.id", "demo-123"));
        match &kvs[2].value {
            Value::Array(Array::String(tags)) => {
                let tags: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
                assert_eq!(
                    tags,
                    vec!["Rust-AgentSDK", "Observability-Tags", "CloudWatch-Demo"]
                );
            }
            other => panic!("tags should be a string array, got {:?}", other),
        }
    }

    #[test]
    fn test_session_id_comes_first() {
        let attributes = TraceAttributes::default().with_session_id("abc-1234");
        let kvs = attributes.to_key_values();
        assert_eq!(kvs[0], KeyValue::new("session.id", "abc-1234"));
    }
}
