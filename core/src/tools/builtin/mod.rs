//! Built-in tools

pub mod http_request;

pub use http_request::{HttpRequestTool, HttpRequestToolFactory};
