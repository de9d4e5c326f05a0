//! Chat relay: HTTP and WebSocket front ends over an inference backend, plus
//! the client the avatar uses to reach it.

pub mod backend;
pub mod client;
pub mod protocol;
pub mod server;

pub use backend::{InferenceBackend, OllamaBackend};
pub use client::{AvatarLink, LinkReceiver, LinkSender};
pub use protocol::{ChatReply, ChatRequest, RelayMessage};
pub use server::RelayServer;
