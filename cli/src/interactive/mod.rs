//! Interactive loops: plain chat and the traced session

pub mod chat;
pub mod input;
pub mod session;

pub use chat::run_chat_loop;
pub use input::StdinLineSource;
pub use session::run_session_loop;
