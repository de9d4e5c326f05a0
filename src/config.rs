//! Configuration types for the avatar animator and chat relay.

use crate::error::{AvatarError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisageConfig {
    /// Timing and weight calibration for the animation drivers.
    pub animation: AnimationConfig,
    /// Mesh-name substrings and morph-target names used to resolve the rig.
    pub meshes: MeshNamesConfig,
    /// Relay server listeners.
    pub relay: RelayConfig,
    /// Inference backend settings.
    pub llm: LlmConfig,
    /// Speech playback settings for the headless avatar.
    pub speech: SpeechConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Animation timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Fixed lip-sync tick period in milliseconds.
    pub lip_sync_tick_ms: u64,
    /// Lower bound of the blink interval in seconds.
    pub blink_min_secs: f32,
    /// Upper bound (exclusive) of the blink interval in seconds.
    pub blink_max_secs: f32,
    /// How long the eyes stay closed per blink, in milliseconds.
    pub blink_duration_ms: u64,
    /// Lower bound of the gesture retarget interval in seconds.
    pub gesture_min_secs: f32,
    /// Upper bound (exclusive) of the gesture retarget interval in seconds.
    pub gesture_max_secs: f32,
    /// Upper bound (exclusive) of a randomised gesture target weight.
    pub gesture_max_weight: f32,
    /// Fraction of the remaining distance covered per frame.
    pub gesture_smoothing: f32,
    /// Frame pump rate in frames per second.
    pub frame_rate: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            lip_sync_tick_ms: 85,
            blink_min_secs: 2.0,
            blink_max_secs: 4.0,
            blink_duration_ms: 120,
            gesture_min_secs: 3.0,
            gesture_max_secs: 5.0,
            gesture_max_weight: 0.8,
            gesture_smoothing: 0.05,
            frame_rate: 60,
        }
    }
}

impl AnimationConfig {
    /// Lip-sync tick period.
    pub fn lip_sync_period(&self) -> Duration {
        Duration::from_millis(self.lip_sync_tick_ms)
    }

    /// Duration the eyes stay closed for a single blink.
    pub fn blink_duration(&self) -> Duration {
        Duration::from_millis(self.blink_duration_ms)
    }

    /// Interval between frame pump ticks.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }

    /// Check that ranges are well-formed and weights stay in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarError::Config`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.lip_sync_tick_ms == 0 {
            return Err(AvatarError::Config("lip_sync_tick_ms must be > 0".into()));
        }
        if self.frame_rate == 0 {
            return Err(AvatarError::Config("frame_rate must be > 0".into()));
        }
        check_range("blink", self.blink_min_secs, self.blink_max_secs)?;
        check_range("gesture", self.gesture_min_secs, self.gesture_max_secs)?;
        if !(0.0..=1.0).contains(&self.gesture_max_weight) {
            return Err(AvatarError::Config(format!(
                "gesture_max_weight {} outside [0, 1]",
                self.gesture_max_weight
            )));
        }
        if !(self.gesture_smoothing > 0.0 && self.gesture_smoothing <= 1.0) {
            return Err(AvatarError::Config(format!(
                "gesture_smoothing {} outside (0, 1]",
                self.gesture_smoothing
            )));
        }
        Ok(())
    }
}

fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && min < max) {
        return Err(AvatarError::Config(format!(
            "{name} interval [{min}, {max}) must be finite, positive and non-empty"
        )));
    }
    Ok(())
}

/// Mesh role substrings and morph-target names.
///
/// Defaults match Ready Player Me style rigs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshNamesConfig {
    /// Substring identifying the head mesh.
    pub head: String,
    /// Substring identifying the teeth mesh.
    pub teeth: String,
    /// Substring identifying the left eye mesh.
    pub eye_left: String,
    /// Substring identifying the right eye mesh.
    pub eye_right: String,
    /// Substring identifying the body mesh.
    pub body: String,
    /// Morph target driven by the viseme open weight.
    pub mouth_open: String,
    /// Morph target driven by the viseme smile weight.
    pub mouth_smile: String,
    /// Candidate blink morph names for the left eye, in preference order.
    pub blink_left: Vec<String>,
    /// Candidate blink morph names for the right eye, in preference order.
    pub blink_right: Vec<String>,
}

impl Default for MeshNamesConfig {
    fn default() -> Self {
        Self {
            head: "Wolf3D_Head".to_owned(),
            teeth: "Wolf3D_Teeth".to_owned(),
            eye_left: "EyeLeft".to_owned(),
            eye_right: "EyeRight".to_owned(),
            body: "Wolf3D_Body".to_owned(),
            mouth_open: "mouthOpen".to_owned(),
            mouth_smile: "mouthSmile".to_owned(),
            blink_left: vec![
                "eyeBlinkLeft".to_owned(),
                "Blink".to_owned(),
                "eyeBlink".to_owned(),
            ],
            blink_right: vec![
                "eyeBlinkRight".to_owned(),
                "Blink".to_owned(),
                "eyeBlink".to_owned(),
            ],
        }
    }
}

/// Relay server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Host to bind both listeners to.
    pub host: String,
    /// Port for the HTTP chat API (0 = auto-assign).
    pub http_port: u16,
    /// Port for the avatar WebSocket (0 = auto-assign).
    pub ws_port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            http_port: 3001,
            ws_port: 3002,
        }
    }
}

impl RelayConfig {
    /// WebSocket URL a local avatar client should connect to.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.ws_port)
    }
}

/// Inference backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the Ollama-compatible server.
    pub api_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Per-request timeout in seconds (0 disables the timeout).
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            // Ollama default endpoint.
            api_url: "http://localhost:11434".to_owned(),
            model: "phi3:mini".to_owned(),
            request_timeout_secs: 120,
        }
    }
}

/// Speech playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Playback rate multiplier.
    pub rate: f32,
    /// Voice pitch multiplier.
    pub pitch: f32,
    /// Speaking speed at rate 1.0, used to estimate utterance length.
    pub words_per_minute: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 0.95,
            pitch: 1.2,
            words_per_minute: 150.0,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily rolling log files (None = stderr only).
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            log_dir: None,
        }
    }
}

impl VisageConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| AvatarError::Config(e.to_string()))?;
        config.animation.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AvatarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/visage/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("visage").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("visage")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/visage-config/config.toml")
        }
    }

    /// Load from `path` when given, else from the default path if it exists,
    /// else return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be loaded.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
