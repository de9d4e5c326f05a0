//! Integration tests: animator timers on a paused tokio clock.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::time::sleep;
use visage::animation::{AvatarAnimationState, NullSink};
use visage::config::{AnimationConfig, MeshNamesConfig, SpeechConfig};
use visage::{Animator, AvatarRig, MeshDescriptor, MeshRole, SpeechSynthesizer, TimedSpeech};

fn rig() -> AvatarRig {
    AvatarRig::from_descriptors(
        [
            MeshDescriptor::new("Wolf3D_Head", vec!["mouthOpen", "mouthSmile"]),
            MeshDescriptor::new("Wolf3D_Teeth", vec!["mouthOpen", "mouthSmile"]),
            MeshDescriptor::new("EyeLeft", vec!["eyeBlinkLeft"]),
            MeshDescriptor::new("EyeRight", vec!["eyeBlinkRight"]),
            MeshDescriptor::new("Wolf3D_Body", vec!["armLeftRaise", "lean"]),
        ],
        &MeshNamesConfig::default(),
    )
}

fn animator(seed: u64) -> Animator {
    let config = AnimationConfig::default();
    let state = AvatarAnimationState::with_rng(&config, rig(), StdRng::seed_from_u64(seed));
    Animator::with_state(&config, state)
}

fn head(animator: &Animator) -> (f32, f32) {
    animator.inspect(|s| {
        let mesh = s.rig.mesh(MeshRole::Head);
        (
            mesh.and_then(|m| m.influence_of("mouthOpen")).unwrap_or(-1.0),
            mesh.and_then(|m| m.influence_of("mouthSmile")).unwrap_or(-1.0),
        )
    })
}

fn cursor(animator: &Animator) -> Option<usize> {
    animator.inspect(|s| s.lip_sync.session().map(|session| session.cursor()))
}

fn eyes_visible(animator: &Animator) -> bool {
    animator.inspect(|s| {
        s.rig
            .mesh(MeshRole::EyeLeft)
            .is_some_and(|m| m.is_visible())
    })
}

#[tokio::test(start_paused = true)]
async fn lip_sync_ticks_every_85ms_and_loops() {
    let animator = animator(1);
    animator.start_lip_sync("mo");
    assert_eq!(head(&animator), (0.0, 0.0), "start writes nothing");

    sleep(Duration::from_millis(90)).await;
    assert_eq!(head(&animator), (0.0, 0.05)); // M

    sleep(Duration::from_millis(85)).await;
    assert_eq!(head(&animator), (0.80, 0.02)); // O

    sleep(Duration::from_millis(85)).await;
    assert_eq!(head(&animator), (0.0, 0.05)); // M again
    assert_eq!(cursor(&animator), Some(1));
}

#[tokio::test(start_paused = true)]
async fn teeth_mirror_the_head() {
    let animator = animator(2);
    animator.start_lip_sync("o");
    sleep(Duration::from_millis(90)).await;
    let teeth = animator.inspect(|s| {
        s.rig
            .mesh(MeshRole::Teeth)
            .map(|m| m.influences().to_vec())
    });
    assert_eq!(teeth, Some(vec![0.80, 0.02]));
}

#[tokio::test(start_paused = true)]
async fn restart_cancels_the_in_flight_timer() {
    let animator = animator(3);
    let first = animator.start_lip_sync("om");
    sleep(Duration::from_millis(40)).await;
    let second = animator.start_lip_sync("om");
    assert_ne!(first, second);

    // The first timer would have fired at 85 ms; the second fires at 125 ms.
    sleep(Duration::from_millis(60)).await;
    assert_eq!(head(&animator), (0.0, 0.0));
    assert_eq!(cursor(&animator), Some(0));

    sleep(Duration::from_millis(30)).await;
    assert_eq!(head(&animator), (0.80, 0.02));
    assert_eq!(cursor(&animator), Some(1));
}

#[tokio::test(start_paused = true)]
async fn stop_zeroes_mouth_and_silences_timer() {
    let animator = animator(4);
    animator.start_lip_sync("o");
    sleep(Duration::from_millis(90)).await;
    assert_eq!(head(&animator), (0.80, 0.02));

    assert!(animator.stop_lip_sync());
    assert_eq!(head(&animator), (0.0, 0.0));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(head(&animator), (0.0, 0.0));
    assert!(!animator.is_speaking());
}

#[tokio::test(start_paused = true)]
async fn frame_pump_blinks_and_reopens_after_120ms() {
    let mut animator = animator(5);
    animator.spawn_frame_pump(NullSink);

    let mut waited = Duration::ZERO;
    while eyes_visible(&animator) {
        assert!(waited < Duration::from_secs(5), "no blink within 5 s");
        sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    assert!(waited >= Duration::from_secs(2), "blinked after {waited:?}");
    assert!(animator.inspect(|s| s.blink.eyes_closed()));

    sleep(Duration::from_millis(60)).await;
    assert!(!eyes_visible(&animator), "reopened too early");

    sleep(Duration::from_millis(80)).await;
    assert!(eyes_visible(&animator), "eyes never reopened");
    animator.shutdown();
}

#[tokio::test(start_paused = true)]
async fn frame_pump_moves_body_within_gesture_range() {
    let mut animator = animator(6);
    animator.spawn_frame_pump(NullSink);

    sleep(Duration::from_millis(5_500)).await;
    let body = animator.inspect(|s| {
        s.rig
            .mesh(MeshRole::Body)
            .map(|m| m.influences().to_vec())
            .unwrap_or_default()
    });
    assert_eq!(body.len(), 2);
    assert!(body.iter().any(|w| *w > 0.0), "{body:?}");
    assert!(body.iter().all(|w| (0.0..0.8).contains(w)), "{body:?}");
    animator.shutdown();
}

#[tokio::test(start_paused = true)]
async fn timed_speech_drives_lip_sync_start_and_stop() {
    let animator = animator(7);
    let (speech, mut events) = TimedSpeech::new(SpeechConfig::default());

    speech.speak("hello there").expect("speak");
    let started = events.recv().await.expect("started event");
    animator.handle_speech_event(&started);
    assert!(animator.is_speaking());

    sleep(Duration::from_millis(200)).await;
    assert_ne!(head(&animator), (0.0, 0.0));

    let ended = events.recv().await.expect("ended event");
    animator.handle_speech_event(&ended);
    assert!(!animator.is_speaking());
    assert_eq!(head(&animator), (0.0, 0.0));
}
