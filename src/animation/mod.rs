//! Avatar animation state and the drivers that mutate it.
//!
//! [`AvatarAnimationState`] bundles the loaded rig with the lip-sync, blink
//! and gesture drivers. Everything here is synchronous and clock-free: the
//! caller supplies frame deltas and session ids. Scheduling lives in
//! [`crate::runtime`].

pub mod blink;
pub mod gesture;
pub mod lip_sync;
pub mod pump;

pub use blink::{BlinkDriver, BlinkOutcome};
pub use gesture::{GestureDriver, GestureMorph};
pub use lip_sync::{LipSyncDriver, LipSyncSession, LipSyncState, SessionId};
pub use pump::{FramePump, FrameReport, FrameSink, NullSink};

use crate::config::AnimationConfig;
use crate::morph::{AvatarRig, MeshRole};
use crate::viseme::VisemeWeights;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform draw in `[min, max)`, or `min` for an empty range.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Everything the animation drivers read and write.
#[derive(Debug)]
pub struct AvatarAnimationState {
    /// Loaded avatar meshes.
    pub rig: AvatarRig,
    /// Mouth driver.
    pub lip_sync: LipSyncDriver,
    /// Eye driver.
    pub blink: BlinkDriver,
    /// Body driver.
    pub gesture: GestureDriver,
    rng: StdRng,
}

impl AvatarAnimationState {
    /// Fresh state over `rig`, seeded from OS entropy.
    pub fn new(config: &AnimationConfig, rig: AvatarRig) -> Self {
        Self::with_rng(config, rig, StdRng::from_entropy())
    }

    /// Fresh state with a caller-provided generator.
    pub fn with_rng(config: &AnimationConfig, rig: AvatarRig, mut rng: StdRng) -> Self {
        let blink = BlinkDriver::new(config, &mut rng);
        let mut gesture = GestureDriver::new(config, &mut rng);
        gesture.track(rig.mesh(MeshRole::Body));
        Self {
            rig,
            lip_sync: LipSyncDriver::new(),
            blink,
            gesture,
            rng,
        }
    }

    /// Swap in a newly loaded rig. Any active lip-sync session is dropped
    /// and the gesture driver re-tracks the new body.
    pub fn attach_rig(&mut self, rig: AvatarRig) {
        self.lip_sync.reset();
        self.gesture.track(rig.mesh(MeshRole::Body));
        self.rig = rig;
    }

    /// Start lip-sync for `text`.
    pub fn start_speech(&mut self, text: &str) -> Option<SessionId> {
        self.lip_sync.start(&self.rig, text)
    }

    /// One lip-sync step for session `id`.
    pub fn lip_sync_tick(&mut self, id: SessionId) -> Option<VisemeWeights> {
        self.lip_sync.tick(id, &mut self.rig)
    }

    /// Stop lip-sync and release the mouth.
    pub fn stop_speech(&mut self) -> bool {
        self.lip_sync.stop(&mut self.rig)
    }

    /// Advance the idle drivers by `delta` seconds: blink first, then gesture.
    pub fn advance(&mut self, delta: f32) -> FrameReport {
        let blink = self.blink.tick(delta, &mut self.rig, &mut self.rng);
        let retargeted = self.gesture.tick(delta, &mut self.rig, &mut self.rng);
        FrameReport {
            delta,
            blink,
            retargeted,
        }
    }

    /// End a blink.
    pub fn reopen_eyes(&mut self) {
        self.blink.reopen(&mut self.rig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshNamesConfig;
    use crate::morph::MeshDescriptor;

    fn full_rig() -> AvatarRig {
        AvatarRig::from_descriptors(
            [
                MeshDescriptor::new("Wolf3D_Head", vec!["mouthOpen", "mouthSmile"]),
                MeshDescriptor::new("EyeLeft", vec!["eyeBlinkLeft"]),
                MeshDescriptor::new("EyeRight", vec!["eyeBlinkRight"]),
                MeshDescriptor::new("Wolf3D_Body", vec!["lean"]),
            ],
            &MeshNamesConfig::default(),
        )
    }

    fn state() -> AvatarAnimationState {
        AvatarAnimationState::with_rng(
            &AnimationConfig::default(),
            full_rig(),
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn uniform_handles_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(uniform(&mut rng, 2.0, 2.0), 2.0);
        assert_eq!(uniform(&mut rng, 3.0, 1.0), 3.0);
        let x = uniform(&mut rng, 0.0, 1.0);
        assert!((0.0..1.0).contains(&x));
    }

    #[test]
    fn advance_runs_blink_then_gesture() {
        let mut s = state();
        let report = s.advance(10.0);
        assert_eq!(report.blink, BlinkOutcome::Closed);
        assert!(report.retargeted);
        assert!(s.blink.eyes_closed());
        s.reopen_eyes();
        assert!(!s.blink.eyes_closed());
    }

    #[test]
    fn speech_round_trip_releases_mouth() {
        let mut s = state();
        let id = s.start_speech("AA").unwrap_or_default();
        assert!(s.lip_sync_tick(id).is_some());
        assert!(s.stop_speech());
        let head = s.rig.mesh(MeshRole::Head).map(|m| m.influences().to_vec());
        assert_eq!(head, Some(vec![0.0, 0.0]));
    }

    #[test]
    fn attach_rig_drops_session_and_retracks_body() {
        let mut s = AvatarAnimationState::with_rng(
            &AnimationConfig::default(),
            AvatarRig::unloaded(),
            StdRng::seed_from_u64(1),
        );
        assert_eq!(s.start_speech("hi"), None);
        assert!(s.gesture.morphs().is_empty());

        s.attach_rig(full_rig());
        assert_eq!(s.gesture.morphs().len(), 1);
        let id = s.start_speech("hi").unwrap_or_default();
        s.attach_rig(full_rig());
        assert!(!s.lip_sync.is_speaking());
        assert_eq!(s.lip_sync_tick(id), None);
    }
}
