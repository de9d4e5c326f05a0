//! Visage: phoneme-driven talking-avatar animation with a chat relay.
//!
//! Text the avatar is about to speak is reduced to coarse phoneme tokens,
//! each token maps to mouth-open / mouth-smile blend-shape weights, and a
//! fixed-rate tick writes those weights into the avatar's head and teeth
//! meshes while speech plays. Independently, idle blinks and smoothed body
//! gestures keep the avatar alive between utterances.
//!
//! # Architecture
//!
//! - **viseme**: phonemizer and the token → weights table
//! - **morph**: morph-target dictionaries, meshes and role resolution
//! - **animation**: lip-sync, blink and gesture drivers over one state value
//! - **runtime**: tokio timers that drive the animation state
//! - **speech**: speech start/end events and a timed synthesizer
//! - **relay**: HTTP/WebSocket chat relay and the avatar's client link

pub mod animation;
pub mod config;
pub mod error;
pub mod logging;
pub mod morph;
pub mod relay;
pub mod runtime;
pub mod speech;
pub mod viseme;

pub use animation::AvatarAnimationState;
pub use config::VisageConfig;
pub use error::{AvatarError, Result};
pub use morph::{AvatarRig, MeshDescriptor, MeshRole};
pub use runtime::Animator;
pub use speech::{SpeechEvent, SpeechSynthesizer, TimedSpeech};
pub use viseme::{VisemeWeights, extract_phonemes};
