//! Idle blinking.
//!
//! Cooldown accumulates per frame. Once it passes a threshold drawn
//! uniformly from the configured interval, the cooldown resets and both eye
//! meshes are hidden; the caller schedules [`BlinkDriver::reopen`] after the
//! blink duration. The cooldown resets even when the eyes are not loaded, so
//! blinks that fall due while the avatar is still loading are dropped.

use super::uniform;
use crate::config::AnimationConfig;
use crate::morph::AvatarRig;
use rand::Rng;
use tracing::trace;

/// What a blink tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkOutcome {
    /// Threshold not reached.
    Waiting,
    /// Eyes hidden; schedule a reopen.
    Closed,
    /// Threshold reached but an eye mesh is missing; cycle skipped.
    Skipped,
}

/// Blink timer state.
#[derive(Debug, Clone)]
pub struct BlinkDriver {
    cooldown: f32,
    threshold: f32,
    eyes_closed: bool,
    min_secs: f32,
    max_secs: f32,
}

impl BlinkDriver {
    /// New driver with its first threshold drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(config: &AnimationConfig, rng: &mut R) -> Self {
        let min_secs = config.blink_min_secs;
        let max_secs = config.blink_max_secs;
        Self {
            cooldown: 0.0,
            threshold: uniform(rng, min_secs, max_secs),
            eyes_closed: false,
            min_secs,
            max_secs,
        }
    }

    /// Seconds accumulated since the last blink.
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Cooldown that triggers the next blink.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether the eyes are currently hidden.
    pub fn eyes_closed(&self) -> bool {
        self.eyes_closed
    }

    /// Advance by `delta` seconds.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        delta: f32,
        rig: &mut AvatarRig,
        rng: &mut R,
    ) -> BlinkOutcome {
        self.cooldown += delta;
        if self.cooldown <= self.threshold {
            return BlinkOutcome::Waiting;
        }

        self.cooldown = 0.0;
        self.threshold = uniform(rng, self.min_secs, self.max_secs);

        if !rig.set_eyes_visible(false) {
            trace!("blink skipped: eye meshes not loaded");
            return BlinkOutcome::Skipped;
        }
        self.eyes_closed = true;
        trace!(next_threshold = self.threshold, "blink");
        BlinkOutcome::Closed
    }

    /// Make both eyes visible again.
    pub fn reopen(&mut self, rig: &mut AvatarRig) {
        rig.set_eyes_visible(true);
        self.eyes_closed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshNamesConfig;
    use crate::morph::{MeshDescriptor, MeshRole};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn eyes() -> AvatarRig {
        AvatarRig::from_descriptors(
            [
                MeshDescriptor::new("EyeLeft", vec!["eyeBlinkLeft"]),
                MeshDescriptor::new("EyeRight", vec!["eyeBlinkRight"]),
            ],
            &MeshNamesConfig::default(),
        )
    }

    fn visible(rig: &AvatarRig) -> (bool, bool) {
        (
            rig.mesh(MeshRole::EyeLeft).is_some_and(|m| m.is_visible()),
            rig.mesh(MeshRole::EyeRight).is_some_and(|m| m.is_visible()),
        )
    }

    #[test]
    fn threshold_drawn_within_interval() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let driver = BlinkDriver::new(&AnimationConfig::default(), &mut rng);
            assert!((2.0..4.0).contains(&driver.threshold()));
        }
    }

    #[test]
    fn below_threshold_never_toggles() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut driver = BlinkDriver::new(&AnimationConfig::default(), &mut rng);
        let mut rig = eyes();
        // 1.9 s total, under the 2 s minimum threshold.
        for _ in 0..19 {
            assert_eq!(driver.tick(0.1, &mut rig, &mut rng), BlinkOutcome::Waiting);
            assert_eq!(visible(&rig), (true, true));
        }
    }

    #[test]
    fn first_exceeding_tick_closes_both_eyes() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut driver = BlinkDriver::new(&AnimationConfig::default(), &mut rng);
        let mut rig = eyes();
        let threshold = driver.threshold();

        let step = 0.05;
        let mut elapsed = 0.0;
        loop {
            elapsed += step;
            let outcome = driver.tick(step, &mut rig, &mut rng);
            if outcome == BlinkOutcome::Closed {
                break;
            }
            assert!(elapsed <= threshold + 1e-3);
            assert_eq!(visible(&rig), (true, true));
        }
        assert!(elapsed > threshold - 1e-3);
        assert_eq!(visible(&rig), (false, false));
        assert!(driver.eyes_closed());
        assert_eq!(driver.cooldown(), 0.0);
    }

    #[test]
    fn reopen_restores_visibility() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut driver = BlinkDriver::new(&AnimationConfig::default(), &mut rng);
        let mut rig = eyes();
        assert_eq!(driver.tick(10.0, &mut rig, &mut rng), BlinkOutcome::Closed);
        driver.reopen(&mut rig);
        assert_eq!(visible(&rig), (true, true));
        assert!(!driver.eyes_closed());
    }

    #[test]
    fn missing_eyes_lose_the_cycle_but_reset_cooldown() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut driver = BlinkDriver::new(&AnimationConfig::default(), &mut rng);
        let mut rig = AvatarRig::unloaded();
        assert_eq!(driver.tick(10.0, &mut rig, &mut rng), BlinkOutcome::Skipped);
        assert_eq!(driver.cooldown(), 0.0);
        assert!(!driver.eyes_closed());
    }

    #[test]
    fn threshold_is_redrawn_after_each_blink() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut driver = BlinkDriver::new(&AnimationConfig::default(), &mut rng);
        let mut rig = eyes();
        let mut seen = Vec::new();
        for _ in 0..5 {
            driver.tick(10.0, &mut rig, &mut rng);
            driver.reopen(&mut rig);
            seen.push(driver.threshold());
        }
        assert!(seen.iter().all(|t| (2.0..4.0).contains(t)));
        assert!(seen.windows(2).any(|w| w[0] != w[1]));
    }
}
