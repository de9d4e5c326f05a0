//! Viseme mapping for lip-sync animation.
//!
//! A viseme is a visual mouth shape that corresponds to a phoneme (sound).
//! Here every viseme is reduced to two blend-shape weights: how far the
//! mouth opens and how much it smiles. The table below is calibration data;
//! the animation only looks as convincing as these numbers.

pub mod phonemize;

pub use phonemize::{PhonemeToken, extract_phonemes};

/// Lookup key used when a session has no phonemes to play.
pub const DEFAULT_KEY: &str = "default";

/// Mouth blend-shape weights for one viseme, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisemeWeights {
    /// Weight for the mouth-open morph target.
    pub open: f32,
    /// Weight for the mouth-smile morph target.
    pub smile: f32,
}

impl VisemeWeights {
    /// Soft idle lip pose used for unknown tokens.
    pub const REST: Self = Self::new(0.05, 0.02);

    /// Fully released mouth.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    const fn new(open: f32, smile: f32) -> Self {
        Self { open, smile }
    }
}

/// Articulatory grouping of the table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisemeClass {
    /// AA, AH, AO, AW
    OpenVowel,
    /// AE, EH, E, IY, EE
    SmileVowel,
    /// OW, O, UH, UW, OO
    RoundVowel,
    /// B, P, M
    ClosedLips,
    /// D, L, T, S, Z, N
    MidTongue,
    /// K, G, NG
    BackTongue,
    /// F, V (teeth on lip)
    Fricative,
    /// W, Q
    Glide,
    /// SH, CH, JH, ZH
    Sibilant,
    /// TH, DH
    Dental,
    /// R, ER
    Rhotic,
    /// Y
    GlideY,
}

/// One row of the viseme table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisemeEntry {
    /// Phoneme tag.
    pub token: &'static str,
    /// Articulatory group.
    pub class: VisemeClass,
    /// Mouth weights.
    pub weights: VisemeWeights,
}

const fn entry(token: &'static str, class: VisemeClass, open: f32, smile: f32) -> VisemeEntry {
    VisemeEntry {
        token,
        class,
        weights: VisemeWeights::new(open, smile),
    }
}

/// The full phoneme → viseme calibration table.
pub const VISEME_TABLE: &[VisemeEntry] = &[
    entry("AA", VisemeClass::OpenVowel, 1.00, 0.10),
    entry("AH", VisemeClass::OpenVowel, 0.95, 0.10),
    entry("AO", VisemeClass::OpenVowel, 0.90, 0.05),
    entry("AW", VisemeClass::OpenVowel, 0.90, 0.05),
    entry("AE", VisemeClass::SmileVowel, 0.75, 0.30),
    entry("EH", VisemeClass::SmileVowel, 0.65, 0.35),
    entry("E", VisemeClass::SmileVowel, 0.65, 0.40),
    entry("IY", VisemeClass::SmileVowel, 0.55, 0.55),
    entry("EE", VisemeClass::SmileVowel, 0.55, 0.55),
    entry("OW", VisemeClass::RoundVowel, 0.75, 0.02),
    entry("O", VisemeClass::RoundVowel, 0.80, 0.02),
    entry("UH", VisemeClass::RoundVowel, 0.55, 0.00),
    entry("UW", VisemeClass::RoundVowel, 0.40, 0.00),
    entry("OO", VisemeClass::RoundVowel, 0.40, 0.00),
    entry("B", VisemeClass::ClosedLips, 0.00, 0.05),
    entry("P", VisemeClass::ClosedLips, 0.00, 0.05),
    entry("M", VisemeClass::ClosedLips, 0.00, 0.05),
    entry("D", VisemeClass::MidTongue, 0.30, 0.10),
    entry("L", VisemeClass::MidTongue, 0.30, 0.10),
    entry("T", VisemeClass::MidTongue, 0.28, 0.10),
    entry("S", VisemeClass::MidTongue, 0.25, 0.15),
    entry("Z", VisemeClass::MidTongue, 0.25, 0.15),
    entry("N", VisemeClass::MidTongue, 0.28, 0.10),
    entry("K", VisemeClass::BackTongue, 0.20, 0.00),
    entry("G", VisemeClass::BackTongue, 0.22, 0.00),
    entry("NG", VisemeClass::BackTongue, 0.18, 0.00),
    entry("F", VisemeClass::Fricative, 0.15, 0.25),
    entry("V", VisemeClass::Fricative, 0.15, 0.25),
    entry("W", VisemeClass::Glide, 0.35, 0.00),
    entry("Q", VisemeClass::Glide, 0.35, 0.00),
    entry("SH", VisemeClass::Sibilant, 0.22, 0.10),
    entry("CH", VisemeClass::Sibilant, 0.22, 0.10),
    entry("JH", VisemeClass::Sibilant, 0.22, 0.10),
    entry("ZH", VisemeClass::Sibilant, 0.22, 0.10),
    entry("TH", VisemeClass::Dental, 0.35, 0.15),
    entry("DH", VisemeClass::Dental, 0.35, 0.15),
    entry("R", VisemeClass::Rhotic, 0.35, 0.05),
    entry("ER", VisemeClass::Rhotic, 0.35, 0.05),
    entry("Y", VisemeClass::GlideY, 0.45, 0.25),
];

/// Find the table entry for `token`, if any.
pub fn lookup(token: &str) -> Option<&'static VisemeEntry> {
    VISEME_TABLE.iter().find(|e| e.token == token)
}

/// Weights for `token`, falling back to [`VisemeWeights::REST`] on a miss.
///
/// Letters such as `A`, `I` or `U` have no entry of their own and therefore
/// play the rest pose.
pub fn viseme_weights(token: &str) -> VisemeWeights {
    lookup(token).map_or(VisemeWeights::REST, |e| e.weights)
}
