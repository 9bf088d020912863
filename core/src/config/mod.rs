//! Configuration module for Weather Agent core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{
    InvokeConfig, ModelConfig, ModelParams, RuntimeConfig, TelemetryConfig, TraceAttributes,
    DEFAULT_MODEL_ID, DEFAULT_REGION,
};
