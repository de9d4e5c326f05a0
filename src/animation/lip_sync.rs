//! Lip-sync driver: a two-state (Idle / Speaking) machine.
//!
//! `start` phonemizes the utterance and opens a session; every tick writes
//! the viseme under the cursor into the head (and teeth) mouth targets and
//! advances the cursor, wrapping to the beginning so the sequence loops until
//! `stop`. The driver does not own a clock: whoever calls `start` arms the
//! recurring tick and passes the returned [`SessionId`] back with each tick,
//! so a tick armed for an older session can never write into the mesh.

use crate::morph::{AvatarRig, MeshRole};
use crate::viseme::{self, DEFAULT_KEY, PhonemeToken, VisemeWeights};
use tracing::debug;

/// Identifies one lip-sync session. Strictly increasing per driver.
pub type SessionId = u64;

/// One utterance being played back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LipSyncSession {
    id: SessionId,
    text: String,
    phonemes: Vec<PhonemeToken>,
    cursor: usize,
}

impl LipSyncSession {
    fn new(id: SessionId, text: &str) -> Self {
        Self {
            id,
            text: text.to_owned(),
            phonemes: viseme::extract_phonemes(text),
            cursor: 0,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The utterance text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Phoneme sequence being looped.
    pub fn phonemes(&self) -> &[PhonemeToken] {
        &self.phonemes
    }

    /// Index of the next phoneme to play.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Key for the phoneme under the cursor, or the default key for an empty
    /// sequence.
    fn current_key(&self) -> &'static str {
        self.phonemes
            .get(self.cursor)
            .map_or(DEFAULT_KEY, PhonemeToken::as_str)
    }

    fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.phonemes.len() {
            self.cursor = 0;
        }
    }
}

/// Driver state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LipSyncState {
    /// Mouth released, nothing scheduled.
    #[default]
    Idle,
    /// Playing a session.
    Speaking(LipSyncSession),
}

/// Steps through phonemes and writes mouth weights.
#[derive(Debug, Default)]
pub struct LipSyncDriver {
    state: LipSyncState,
    next_id: SessionId,
}

impl LipSyncDriver {
    /// New idle driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &LipSyncState {
        &self.state
    }

    /// Whether a session is active.
    pub fn is_speaking(&self) -> bool {
        matches!(self.state, LipSyncState::Speaking(_))
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&LipSyncSession> {
        match &self.state {
            LipSyncState::Speaking(s) => Some(s),
            LipSyncState::Idle => None,
        }
    }

    /// Begin a session for `text`, replacing any active one.
    ///
    /// Returns `None` without touching state when the head mesh is not
    /// resolved; speech may begin before the avatar finishes loading.
    pub fn start(&mut self, rig: &AvatarRig, text: &str) -> Option<SessionId> {
        if !rig.has(MeshRole::Head) {
            debug!("lip-sync start ignored: head mesh not loaded");
            return None;
        }
        if let LipSyncState::Speaking(previous) = &self.state {
            debug!(replaced = previous.id, "lip-sync session replaced");
        }

        self.next_id += 1;
        let session = LipSyncSession::new(self.next_id, text);
        debug!(
            session = session.id,
            phonemes = session.phonemes.len(),
            "lip-sync session started"
        );
        let id = session.id;
        self.state = LipSyncState::Speaking(session);
        Some(id)
    }

    /// Apply the viseme under the cursor of session `id` and advance.
    ///
    /// Returns the weights written, or `None` when `id` is not the active
    /// session (stale tick) or the driver is idle.
    pub fn tick(&mut self, id: SessionId, rig: &mut AvatarRig) -> Option<VisemeWeights> {
        let LipSyncState::Speaking(session) = &mut self.state else {
            return None;
        };
        if session.id != id {
            return None;
        }

        let weights = viseme::viseme_weights(session.current_key());
        rig.write_mouth(weights);
        session.advance();
        Some(weights)
    }

    /// End the active session and zero the mouth weights.
    ///
    /// Returns `false` and does nothing when the head mesh is not resolved.
    pub fn stop(&mut self, rig: &mut AvatarRig) -> bool {
        if !rig.has(MeshRole::Head) {
            return false;
        }
        if let LipSyncState::Speaking(session) = &self.state {
            debug!(session = session.id, "lip-sync session stopped");
        }
        self.state = LipSyncState::Idle;
        rig.write_mouth(VisemeWeights::ZERO);
        true
    }

    /// Drop the active session without writing to any mesh.
    pub(crate) fn reset(&mut self) {
        self.state = LipSyncState::Idle;
    }
}
