//! Headless avatar: chats with the relay from stdin and animates a rig
//! without drawing it.
//!
//! Replies are printed to stdout and "spoken" by a timed synthesizer whose
//! start/end events drive lip-sync. Mouth and eye changes are logged at
//! debug level (`RUST_LOG=visage=debug`).

use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use visage::animation::FrameSink;
use visage::config::MeshNamesConfig;
use visage::relay::AvatarLink;
use visage::{
    Animator, AvatarRig, MeshDescriptor, MeshRole, SpeechSynthesizer, TimedSpeech, VisageConfig,
};

/// Talk to the avatar relay from the terminal.
#[derive(Parser)]
#[command(name = "visage-avatar", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay WebSocket URL (defaults to the configured relay address).
    #[arg(long)]
    relay_url: Option<String>,

    /// JSON file with the avatar's meshes: `[{"name": ..., "morph_targets": [...]}]`.
    #[arg(long)]
    avatar: Option<PathBuf>,
}

/// Logs the pose whenever the mouth weights or eye visibility change.
#[derive(Default)]
struct PoseTrace {
    last: Option<(f32, f32, bool)>,
}

impl FrameSink for PoseTrace {
    fn render(&mut self, rig: &AvatarRig) {
        let Some(head) = rig.mesh(MeshRole::Head) else {
            return;
        };
        let mouth = rig.head_mouth();
        let open = mouth.open.and_then(|i| head.influence(i)).unwrap_or_default();
        let smile = mouth.smile.and_then(|i| head.influence(i)).unwrap_or_default();
        let eyes_open = rig.mesh(MeshRole::EyeLeft).is_none_or(|m| m.is_visible());

        let pose = (open, smile, eyes_open);
        if self.last != Some(pose) {
            debug!(open, smile, eyes_open, "pose");
            self.last = Some(pose);
        }
    }
}

fn builtin_avatar(names: &MeshNamesConfig) -> Vec<MeshDescriptor> {
    let mouth = vec![names.mouth_open.clone(), names.mouth_smile.clone()];
    vec![
        MeshDescriptor::new(names.head.clone(), mouth.clone()),
        MeshDescriptor::new(names.teeth.clone(), mouth),
        MeshDescriptor::new(names.eye_left.clone(), vec!["eyeBlinkLeft"]),
        MeshDescriptor::new(names.eye_right.clone(), vec!["eyeBlinkRight"]),
        MeshDescriptor::new(
            names.body.clone(),
            vec!["armLeftRaise", "armRightRaise", "shoulderShrug", "lean"],
        ),
    ]
}

fn load_rig(path: Option<&Path>, names: &MeshNamesConfig) -> anyhow::Result<AvatarRig> {
    let descriptors = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            serde_json::from_str::<Vec<MeshDescriptor>>(&content)
                .map_err(|e| anyhow::anyhow!("invalid avatar file {}: {e}", p.display()))?
        }
        None => builtin_avatar(names),
    };
    let rig = AvatarRig::from_descriptors(descriptors, names);
    for target in rig.meshes().iter().flat_map(|m| m.morph_targets()) {
        debug!(mesh = %target.mesh, name = %target.name, index = target.index, "morph target");
    }
    Ok(rig)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = VisageConfig::load_or_default(cli.config.as_deref())?;
    let _log_guard = visage::logging::init(&config.logging)?;

    let rig = load_rig(cli.avatar.as_deref(), &config.meshes)?;
    let mut animator = Animator::new(&config.animation, rig);
    animator.spawn_frame_pump(PoseTrace::default());

    let (speech, mut speech_events) = TimedSpeech::new(config.speech.clone());

    let url = cli.relay_url.unwrap_or_else(|| config.relay.ws_url());
    let (mut sender, mut receiver) = AvatarLink::connect(&url).await?.split();
    info!(%url, "connected to relay");
    println!("Connected to {url}. Type a message and press Enter; Ctrl+C to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    sender.send_user_message(&line).await?;
                }
                None => break,
            },
            reply = receiver.next_speech() => match reply? {
                Some(text) => {
                    println!("avatar: {text}");
                    speech.speak(&text)?;
                }
                None => {
                    info!("relay closed the connection");
                    break;
                }
            },
            Some(event) = speech_events.recv() => animator.handle_speech_event(&event),
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    speech.cancel()?;
    if let Err(e) = sender.close().await {
        debug!("close failed: {e}");
    }
    animator.shutdown();
    Ok(())
}
