//! Speech collaborator.
//!
//! The animator only needs to know when an utterance starts (with its text)
//! and when it ends. [`TimedSpeech`] simulates playback by holding each
//! utterance for its estimated spoken duration, which is all a headless
//! avatar needs.

use crate::config::SpeechConfig;
use crate::error::{AvatarError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Shortest utterance [`TimedSpeech`] will simulate.
pub const MIN_UTTERANCE: Duration = Duration::from_millis(250);

/// Lifecycle events for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Playback of `text` began.
    Started {
        /// Utterance text.
        text: String,
    },
    /// Playback finished or was cut off.
    Ended,
}

/// Anything that can speak text and report start/end.
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`, cutting off any utterance in progress.
    fn speak(&self, text: &str) -> Result<()>;

    /// Cut off the current utterance, if any.
    fn cancel(&self) -> Result<()>;
}

/// Estimate how long `text` takes to say at `words_per_minute`.
///
/// The rate is clamped to at least 30 wpm.
pub fn estimate_duration(text: &str, words_per_minute: f32) -> Duration {
    let words = text.split_whitespace().count() as f32;
    let minutes = words / words_per_minute.max(30.0);
    Duration::from_secs_f32(minutes * 60.0)
}

#[derive(Debug, Default)]
struct Playback {
    generation: u64,
    speaking: bool,
    task: Option<JoinHandle<()>>,
}

/// Synthesizer that emits events on a timer instead of producing audio.
#[derive(Debug)]
pub struct TimedSpeech {
    events: mpsc::UnboundedSender<SpeechEvent>,
    config: SpeechConfig,
    playback: Arc<Mutex<Playback>>,
}

impl TimedSpeech {
    /// New synthesizer and the receiver its events arrive on.
    pub fn new(config: SpeechConfig) -> (Self, mpsc::UnboundedReceiver<SpeechEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let speech = Self {
            events: tx,
            config,
            playback: Arc::new(Mutex::new(Playback::default())),
        };
        (speech, rx)
    }

    /// Simulated duration of `text` at the configured rate.
    pub fn utterance_duration(&self, text: &str) -> Duration {
        let wpm = self.config.words_per_minute * self.config.rate;
        estimate_duration(text, wpm).max(MIN_UTTERANCE)
    }

    /// Whether an utterance is playing.
    pub fn is_speaking(&self) -> bool {
        self.playback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .speaking
    }

    fn send(&self, event: SpeechEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| AvatarError::Channel("speech event receiver dropped".to_owned()))
    }

    fn cut_off(&self, playback: &mut Playback) -> Result<()> {
        if let Some(task) = playback.task.take() {
            task.abort();
        }
        if playback.speaking {
            playback.speaking = false;
            debug!(generation = playback.generation, "utterance cut off");
            self.send(SpeechEvent::Ended)?;
        }
        Ok(())
    }
}

impl SpeechSynthesizer for TimedSpeech {
    fn speak(&self, text: &str) -> Result<()> {
        let duration = self.utterance_duration(text);
        let mut playback = self.playback.lock().unwrap_or_else(|e| e.into_inner());
        self.cut_off(&mut playback)?;

        playback.generation += 1;
        playback.speaking = true;
        let generation = playback.generation;
        debug!(
            generation,
            rate = self.config.rate,
            pitch = self.config.pitch,
            ?duration,
            "utterance started"
        );
        self.send(SpeechEvent::Started {
            text: text.to_owned(),
        })?;

        let shared = Arc::clone(&self.playback);
        let events = self.events.clone();
        playback.task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut playback = shared.lock().unwrap_or_else(|e| e.into_inner());
            if playback.generation == generation && playback.speaking {
                playback.speaking = false;
                playback.task = None;
                let _ = events.send(SpeechEvent::Ended);
            }
        }));
        Ok(())
    }

    fn cancel(&self) -> Result<()> {
        let mut playback = self.playback.lock().unwrap_or_else(|e| e.into_inner());
        self.cut_off(&mut playback)
    }
}

impl Drop for TimedSpeech {
    fn drop(&mut self) {
        let mut playback = self.playback.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = playback.task.take() {
            task.abort();
        }
    }
}
