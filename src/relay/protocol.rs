//! Wire types shared by the relay server and the avatar link.

use serde::{Deserialize, Serialize};

/// WebSocket frames exchanged between the avatar and the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Avatar → relay: something the user typed or said.
    UserMessage {
        /// Prompt text.
        text: String,
    },
    /// Relay → avatar: a reply for the avatar to speak.
    AvatarSpeech {
        /// Reply text.
        text: String,
    },
}

/// `POST /chat` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prompt text.
    pub message: String,
}

/// `POST /chat` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Model reply.
    pub reply: String,
}

/// Error body returned by the HTTP routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Short description.
    pub error: String,
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReply {
    /// Always `"ok"`.
    pub status: String,
}

/// What the relay should do with one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Forward `prompt` to the inference backend.
    Prompt(String),
    /// Nothing to do.
    Ignore,
}

/// Interpret an inbound WebSocket text frame.
///
/// A `user_message` yields its text; a frame that is not a JSON object
/// (plain words, `42`, `"hi"`) is taken as a raw prompt. Any other JSON
/// object, and blank prompts, are ignored.
pub fn parse_inbound(frame: &str) -> Inbound {
    let prompt = match serde_json::from_str::<serde_json::Value>(frame) {
        Ok(value) if value.is_object() => match serde_json::from_value::<RelayMessage>(value) {
            Ok(RelayMessage::UserMessage { text }) => text,
            Ok(RelayMessage::AvatarSpeech { .. }) | Err(_) => return Inbound::Ignore,
        },
        _ => frame.to_owned(),
    };
    if prompt.trim().is_empty() {
        Inbound::Ignore
    } else {
        Inbound::Prompt(prompt)
    }
}
