//! Idle body gestures.
//!
//! Every body morph target gets a `(current, target)` pair. Targets are
//! re-randomised on a timer; every frame each current value covers a fixed
//! fraction of the remaining distance to its target and is written into the
//! body mesh. The smoothing step is per frame, not per second.

use super::uniform;
use crate::config::AnimationConfig;
use crate::morph::{AvatarRig, Mesh, MeshRole};
use rand::Rng;
use tracing::{debug, trace};

/// Smoothing state for one body morph target.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureMorph {
    /// Morph target name.
    pub name: String,
    /// Slot in the body mesh's influence array.
    pub index: usize,
    /// Weight last written to the mesh.
    pub current: f32,
    /// Weight being approached.
    pub target: f32,
}

/// Drives body morph targets toward randomly chosen idle poses.
#[derive(Debug, Clone)]
pub struct GestureDriver {
    morphs: Vec<GestureMorph>,
    timer: f32,
    threshold: f32,
    min_secs: f32,
    max_secs: f32,
    max_weight: f32,
    smoothing: f32,
}

impl GestureDriver {
    /// New driver tracking no morphs yet.
    pub fn new<R: Rng + ?Sized>(config: &AnimationConfig, rng: &mut R) -> Self {
        Self {
            morphs: Vec::new(),
            timer: 0.0,
            threshold: uniform(rng, config.gesture_min_secs, config.gesture_max_secs),
            min_secs: config.gesture_min_secs,
            max_secs: config.gesture_max_secs,
            max_weight: config.gesture_max_weight,
            smoothing: config.gesture_smoothing,
        }
    }

    /// Start tracking every morph target of `body`, all at rest.
    pub fn track(&mut self, body: Option<&Mesh>) {
        self.morphs = body
            .map(|mesh| {
                mesh.dictionary()
                    .iter()
                    .map(|(name, index)| GestureMorph {
                        name: name.to_owned(),
                        index,
                        current: 0.0,
                        target: 0.0,
                    })
                    .collect()
            })
            .unwrap_or_default();
        debug!(morphs = self.morphs.len(), "gesture morphs tracked");
    }

    /// Tracked morphs.
    pub fn morphs(&self) -> &[GestureMorph] {
        &self.morphs
    }

    /// Seconds since the last retarget.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Timer value that triggers the next retarget.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Advance by `delta` seconds. Returns `true` when targets were redrawn.
    ///
    /// Does nothing at all while the body mesh is unresolved.
    pub fn tick<R: Rng + ?Sized>(&mut self, delta: f32, rig: &mut AvatarRig, rng: &mut R) -> bool {
        let Some(body) = rig.mesh_mut(MeshRole::Body) else {
            return false;
        };

        self.timer += delta;
        let retarget = self.timer > self.threshold;
        if retarget {
            self.timer = 0.0;
            self.threshold = uniform(rng, self.min_secs, self.max_secs);
            for m in &mut self.morphs {
                m.target = uniform(rng, 0.0, self.max_weight);
            }
            trace!(next_threshold = self.threshold, "gesture retarget");
        }

        for m in &mut self.morphs {
            m.current += (m.target - m.current) * self.smoothing;
            body.set_influence(m.index, m.current);
        }
        retarget
    }
}
