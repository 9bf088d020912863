//! # Weather Agent Core
//!
//! Core library for the weather agent: a Bedrock-hosted model that answers
//! weather questions by calling the National Weather Service API through an
//! HTTP tool.
//!
//! The library provides the agent event loop, the Bedrock Converse client,
//! the `http_request` tool, OpenTelemetry tracing with session baggage, the
//! agent runtime HTTP entrypoint and a client for invoking deployed runtimes.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod invoke;
pub mod llm;
pub mod runtime;
pub mod telemetry;
pub mod tools;
pub mod weather;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentCore, AgentResponse};
pub use config::{
    InvokeConfig, ModelConfig, ModelParams, RuntimeConfig, TelemetryConfig, TraceAttributes,
};
pub use error::{Error, Result};
pub use invoke::{AgentRuntimeClient, InvokeAgentRuntimeRequest, ResponseMetadata};
pub use runtime::handle_invocation;
pub use telemetry::{current_trace_id, init_telemetry, SessionContext, TelemetryGuard};
pub use weather::{extract_location, process_weather_query};

/// Current version of the weather-agent-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
