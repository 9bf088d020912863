//! Agent runtime entrypoint and HTTP service

pub mod entrypoint;
pub mod server;

pub use entrypoint::handle_invocation;
pub use server::{
    build_router, invocations_inner, ping_inner, serve, RuntimeState, SESSION_HEADER,
};
