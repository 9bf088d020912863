//! LLM provider implementations

pub mod bedrock;

pub use bedrock::{converse_message_json, BedrockClient};
