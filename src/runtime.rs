//! Tokio scheduling for the animation core.
//!
//! Three activities run independently: the frame pump (one tick per display
//! refresh), the recurring lip-sync tick armed by each speech start, and the
//! one-shot reopen after a blink. All of them lock the same
//! [`AvatarAnimationState`] for the duration of a single synchronous step.

use crate::animation::{AvatarAnimationState, BlinkOutcome, FramePump, FrameSink, SessionId};
use crate::config::AnimationConfig;
use crate::morph::AvatarRig;
use crate::speech::SpeechEvent;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A spawned timer task. Cancelled on [`cancel`](Self::cancel) or drop.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Call `f` every `period`, first after one full period. The task ends
    /// when `f` returns `false`.
    pub fn every<F>(period: Duration, mut f: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !f() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Call `f` once after `delay`.
    pub fn after<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self { handle }
    }

    /// Abort the task.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug)]
struct Shared {
    state: AvatarAnimationState,
    lip_timer: Option<ScheduledTask>,
    reopen_timer: Option<ScheduledTask>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Owns the animation state and every timer that mutates it.
///
/// Must be used from within a tokio runtime.
pub struct Animator {
    shared: Arc<Mutex<Shared>>,
    config: AnimationConfig,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl Animator {
    /// Animator over `rig` with entropy-seeded idle behaviour.
    pub fn new(config: &AnimationConfig, rig: AvatarRig) -> Self {
        Self::with_state(config, AvatarAnimationState::new(config, rig))
    }

    /// Animator over a prepared state (e.g. with a seeded generator).
    pub fn with_state(config: &AnimationConfig, state: AvatarAnimationState) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state,
                lip_timer: None,
                reopen_timer: None,
            })),
            config: config.clone(),
            cancel: CancellationToken::new(),
            pump: None,
        }
    }

    /// Start the frame pump, rendering into `sink` after every step.
    ///
    /// Replaces a pump started earlier, including one stopped by
    /// [`shutdown`](Self::shutdown).
    pub fn spawn_frame_pump<S>(&mut self, mut sink: S)
    where
        S: FrameSink + 'static,
    {
        if let Some(old) = self.pump.take() {
            old.abort();
        }
        self.cancel.cancel();
        self.cancel = CancellationToken::new();

        let weak = Arc::downgrade(&self.shared);
        let cancel = self.cancel.clone();
        let period = self.config.frame_period();
        let reopen_after = self.config.blink_duration();

        self.pump = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut pump = FramePump::new();
            info!(?period, "frame pump started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(shared) = weak.upgrade() else { break };
                        pump_frame(&shared, &mut pump, &mut sink, reopen_after);
                    }
                }
            }
            debug!("frame pump stopped");
        }));
    }

    /// Begin lip-sync for `text`, replacing any session and its tick timer.
    ///
    /// Returns `None` and leaves everything untouched when no head mesh is
    /// loaded.
    pub fn start_lip_sync(&self, text: &str) -> Option<SessionId> {
        let mut guard = lock(&self.shared);
        let id = guard.state.start_speech(text)?;

        if let Some(previous) = guard.lip_timer.take() {
            previous.cancel();
        }
        let weak = Arc::downgrade(&self.shared);
        guard.lip_timer = Some(ScheduledTask::every(
            self.config.lip_sync_period(),
            move || lip_sync_step(&weak, id),
        ));
        Some(id)
    }

    /// Stop lip-sync, cancel its timer and release the mouth.
    pub fn stop_lip_sync(&self) -> bool {
        let mut guard = lock(&self.shared);
        if let Some(timer) = guard.lip_timer.take() {
            timer.cancel();
        }
        guard.state.stop_speech()
    }

    /// Route a speech collaborator event.
    pub fn handle_speech_event(&self, event: &SpeechEvent) {
        match event {
            SpeechEvent::Started { text } => {
                self.start_lip_sync(text);
            }
            SpeechEvent::Ended => {
                self.stop_lip_sync();
            }
        }
    }

    /// Swap in a newly loaded avatar. Drops any lip-sync session.
    pub fn attach_rig(&self, rig: AvatarRig) {
        let mut guard = lock(&self.shared);
        if let Some(timer) = guard.lip_timer.take() {
            timer.cancel();
        }
        guard.state.attach_rig(rig);
    }

    /// Whether a lip-sync session is active.
    pub fn is_speaking(&self) -> bool {
        lock(&self.shared).state.lip_sync.is_speaking()
    }

    /// Read the state under the lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&AvatarAnimationState) -> R) -> R {
        f(&lock(&self.shared).state)
    }

    /// Copy of the rig as it is right now.
    pub fn rig_snapshot(&self) -> AvatarRig {
        self.inspect(|state| state.rig.clone())
    }

    /// Stop the pump and every pending timer.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        let mut guard = lock(&self.shared);
        guard.lip_timer = None;
        guard.reopen_timer = None;
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One frame stamped with the current instant.
fn pump_frame(
    shared: &Arc<Mutex<Shared>>,
    pump: &mut FramePump,
    sink: &mut dyn FrameSink,
    reopen_after: Duration,
) {
    let mut guard = lock(shared);
    let report = pump.frame(Instant::now(), &mut guard.state, sink);
    if report.blink == BlinkOutcome::Closed {
        guard.reopen_timer = Some(schedule_reopen(shared, reopen_after));
    }
}

fn lip_sync_step(weak: &Weak<Mutex<Shared>>, id: SessionId) -> bool {
    let Some(shared) = weak.upgrade() else {
        return false;
    };
    let mut guard = lock(&shared);
    guard.state.lip_sync_tick(id).is_some()
}

/// Arm the one-shot reopen. Assigning the result over an older pending
/// reopen cancels that one.
fn schedule_reopen(shared: &Arc<Mutex<Shared>>, delay: Duration) -> ScheduledTask {
    let weak = Arc::downgrade(shared);
    ScheduledTask::after(delay, move || {
        if let Some(shared) = weak.upgrade() {
            lock(&shared).state.reopen_eyes();
        }
    })
}
