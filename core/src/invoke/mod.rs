//! Client for invoking a deployed agent runtime

pub mod client;

pub use client::{
    AgentRuntimeClient, InvokeAgentRuntimeRequest, InvokeAgentRuntimeResponse, ResponseMetadata,
};
