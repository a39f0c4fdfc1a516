//! Age bands and the writing, illustration and voice profiles derived from them.

use serde::{Deserialize, Serialize};

/// Target age band of a story.
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
    strum::IntoStaticStr,
)]
pub enum AgeGroup {
    /// Newborns
    #[serde(rename = "0-6 months")]
    #[strum(serialize = "0-6 months")]
    #[display("0-6 months")]
    ZeroToSixMonths,
    /// Babies
    #[serde(rename = "6-18 months")]
    #[strum(serialize = "6-18 months")]
    #[display("6-18 months")]
    SixToEighteenMonths,
    /// Toddlers
    #[serde(rename = "18-36 months")]
    #[strum(serialize = "18-36 months")]
    #[display("18-36 months")]
    EighteenToThirtySixMonths,
    /// Preschoolers
    #[default]
    #[serde(rename = "3-4 years")]
    #[strum(serialize = "3-4 years")]
    #[display("3-4 years")]
    ThreeToFourYears,
    /// Kindergarteners
    #[serde(rename = "4-5 years")]
    #[strum(serialize = "4-5 years")]
    #[display("4-5 years")]
    FourToFiveYears,
}

/// Writing constraints for one age band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeProfile {
    /// Exact number of pages the story must have
    pub pages: u32,
    /// Approximate words per page
    pub words_per_page: u32,
    /// Narrative style guidance
    pub style: &'static str,
    /// Plot complexity guidance
    pub complexity: &'static str,
    /// Illustration art style
    pub art_style: &'static str,
    /// Safety modifier appended to image prompts
    pub image_modifier: &'static str,
}

/// Speaking rate for narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SpeechRate {
    /// Slowed-down speech
    #[display("slow")]
    Slow,
    /// Slightly slowed speech
    #[display("medium")]
    Medium,
    /// Regular speech
    #[display("normal")]
    Normal,
}

/// Narration voice settings for one age band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    /// Speaking rate
    pub rate: SpeechRate,
    /// Raise pitch for the youngest listeners
    pub high_pitch: bool,
    /// Emphasis hint
    pub emphasis: &'static str,
    /// Free-text voice description for prompt-driven TTS
    pub voice_style: &'static str,
}

impl AgeGroup {
    /// Every band, youngest first.
    pub const ALL: [AgeGroup; 5] = [
        Self::ZeroToSixMonths,
        Self::SixToEighteenMonths,
        Self::EighteenToThirtySixMonths,
        Self::ThreeToFourYears,
        Self::FourToFiveYears,
    ];

    /// Human label, e.g. "3-4 years".
    pub fn label(&self) -> &'static str {
        self.into()
    }

    /// Writing and illustration profile.
    pub fn profile(&self) -> AgeProfile {
        match self {
            Self::ZeroToSixMonths => AgeProfile {
                pages: 4,
                words_per_page: 10,
                style: "single objects, high contrast, simple shapes",
                complexity: "very simple, repetitive",
                art_style: "soft watercolor painting with gentle pastel colors",
                image_modifier: "simple shapes, high contrast, baby-safe",
            },
            Self::SixToEighteenMonths => AgeProfile {
                pages: 6,
                words_per_page: 20,
                style: "familiar objects, bright colors, simple actions",
                complexity: "simple cause and effect",
                art_style: "bright and colorful digital illustration with simple shapes",
                image_modifier: "bright primary colors, rounded shapes, toddler-friendly",
            },
            Self::EighteenToThirtySixMonths => AgeProfile {
                pages: 8,
                words_per_page: 40,
                style: "characters with emotions, everyday scenes",
                complexity: "mini adventures, simple problems",
                art_style: "vibrant cartoon-style illustration",
                image_modifier: "colorful, friendly faces, preschool appropriate",
            },
            Self::ThreeToFourYears => AgeProfile {
                pages: 10,
                words_per_page: 60,
                style: "imaginative scenes, visual humor",
                complexity: "rhythm and repetition, simple lessons",
                art_style: "detailed children's book illustration with rich colors",
                image_modifier: "playful, imaginative, preschool style",
            },
            Self::FourToFiveYears => AgeProfile {
                pages: 12,
                words_per_page: 80,
                style: "detailed scenes, character interactions",
                complexity: "complete story arc, emotional depth",
                art_style: "whimsical storybook painting with expressive characters",
                image_modifier: "detailed but child-appropriate, kindergarten style",
            },
        }
    }

    /// Narration voice profile.
    pub fn voice(&self) -> VoiceProfile {
        match self {
            Self::ZeroToSixMonths => VoiceProfile {
                rate: SpeechRate::Slow,
                high_pitch: true,
                emphasis: "soft",
                voice_style: "gentle, slow, soothing female voice",
            },
            Self::SixToEighteenMonths => VoiceProfile {
                rate: SpeechRate::Slow,
                high_pitch: false,
                emphasis: "playful",
                voice_style: "cheerful, playful female voice with clear pronunciation",
            },
            Self::EighteenToThirtySixMonths => VoiceProfile {
                rate: SpeechRate::Medium,
                high_pitch: false,
                emphasis: "expressive",
                voice_style: "animated, expressive female voice",
            },
            Self::ThreeToFourYears => VoiceProfile {
                rate: SpeechRate::Medium,
                high_pitch: false,
                emphasis: "animated",
                voice_style: "warm storyteller voice with character expressions",
            },
            Self::FourToFiveYears => VoiceProfile {
                rate: SpeechRate::Normal,
                high_pitch: false,
                emphasis: "dynamic",
                voice_style: "dynamic narrator voice with emotion",
            },
        }
    }
}

/// Map a language name to the short code used by speech services; unknown names map to English.
pub fn speech_language_code(language: &str) -> &'static str {
    match language.trim().to_ascii_lowercase().as_str() {
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "hindi" => "hi",
        "russian" => "ru",
        _ => "en",
    }
}
