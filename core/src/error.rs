//! Error types and handling for Weather Agent Core

use thiserror::Error;

/// Result type alias for Weather Agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Weather Agent Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Runtime entrypoint errors
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Remote agent runtime invocation errors
    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    /// Telemetry setup errors
    #[error("Telemetry error: {message}")]
    Telemetry { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Short type name of the error, recorded as `error.type` on spans
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "ConfigError",
            Error::Llm(_) => "LlmError",
            Error::Tool(_) => "ToolError",
            Error::Agent(_) => "AgentError",
            Error::Runtime(_) => "RuntimeError",
            Error::Invocation(_) => "InvocationError",
            Error::Telemetry { .. } => "TelemetryError",
            Error::Io(_) => "IoError",
            Error::Serialization(_) => "SerializationError",
            Error::Http(_) => "HttpError",
            Error::Generic(_) => "Error",
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Maximum event loop cycles exceeded: {max_cycles}")]
    MaxCyclesExceeded { max_cycles: usize },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Runtime entrypoint errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Payload is missing a string \"prompt\" field")]
    MissingPrompt,
}

/// Remote agent runtime invocation errors
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Agent runtime returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Response body is not valid UTF-8")]
    InvalidBody,
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
