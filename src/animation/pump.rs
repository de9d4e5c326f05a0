//! Per-frame step: measure the delta since the previous frame, tick the idle
//! drivers, then hand the rig to the renderer.

use super::{AvatarAnimationState, BlinkOutcome};
use crate::morph::AvatarRig;
use tokio::time::Instant;

/// Receives the rig after every frame step.
pub trait FrameSink: Send {
    /// Draw (or otherwise consume) the current pose.
    fn render(&mut self, rig: &AvatarRig);
}

/// A sink that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn render(&mut self, _rig: &AvatarRig) {}
}

/// Summary of one frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Seconds since the previous frame.
    pub delta: f32,
    /// What the blink driver did.
    pub blink: BlinkOutcome,
    /// Whether gesture targets were redrawn.
    pub retargeted: bool,
}

/// Tracks the previous frame's timestamp.
#[derive(Debug, Default)]
pub struct FramePump {
    last: Option<Instant>,
}

impl FramePump {
    /// New pump; its first frame has a zero delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame at `now`.
    pub fn frame(
        &mut self,
        now: Instant,
        state: &mut AvatarAnimationState,
        sink: &mut dyn FrameSink,
    ) -> FrameReport {
        let delta = self
            .last
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32());
        self.last = Some(now);
        let report = state.advance(delta);
        sink.render(&state.rig);
        report
    }
}
