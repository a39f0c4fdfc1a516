//! Story tones and their background soundscape settings.

use serde::{Deserialize, Serialize};

/// Mood of a story. Free-text tones outside this set are treated as [`Tone::Wholesome`]
/// for audio purposes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tone {
    /// Silly and light
    #[display("funny")]
    Funny,
    /// Wonder and enchantment
    #[display("magical")]
    Magical,
    /// Mild, age-appropriate suspense
    #[display("scary")]
    Scary,
    /// Warm and gentle
    #[default]
    #[display("wholesome")]
    Wholesome,
    /// Exploration and excitement
    #[display("adventurous")]
    Adventurous,
}

/// Background bed parameters for a tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Soundscape {
    /// Beats per minute of the bed
    pub tempo: u32,
    /// Frequency of the background sine in hertz
    pub frequency_hz: f32,
    /// Attenuation below the narration in decibels
    pub attenuation_db: f32,
}

impl Tone {
    /// Parse a free-text tone, falling back to the default.
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }

    /// Background bed settings.
    pub fn soundscape(&self) -> Soundscape {
        let (tempo, high) = match self {
            Self::Funny => (120, true),
            Self::Magical => (80, false),
            Self::Scary => (60, false),
            Self::Wholesome => (90, false),
            Self::Adventurous => (110, false),
        };
        Soundscape {
            tempo,
            frequency_hz: if high { 440.0 } else { 220.0 },
            attenuation_db: 20.0,
        }
    }
}
