//! Error types for the avatar relay and configuration layers.
//!
//! The animation core itself never fails: unresolved meshes and unknown
//! phoneme tokens degrade to no-ops and rest poses. Errors only surface from
//! configuration, networking and the inference backend.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Configuration file could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// Relay server bind or serve error.
    #[error("relay error: {0}")]
    Relay(String),

    /// Inference backend request failed or returned an unusable body.
    #[error("inference error: {0}")]
    Inference(String),

    /// Malformed transport payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AvatarError>;
