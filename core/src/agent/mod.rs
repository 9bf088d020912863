//! Agent core logic and event loop

pub mod base;
pub mod config;
pub mod core;
pub mod prompt;

pub use base::{Agent, AgentResponse, AgentResult};
pub use config::{AgentBuilder, AgentConfig};
pub use core::AgentCore;
pub use prompt::WEATHER_SYSTEM_PROMPT;
