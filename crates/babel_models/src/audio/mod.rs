//! Narration backends.

mod fallback;
mod gemini;
mod mixing;
pub mod mp3;
mod tone;
mod translate;
pub mod wav;

pub use fallback::FallbackNarrator;
pub use gemini::GeminiNarrator;
pub use mixing::MixingNarrator;
pub use tone::ToneNarrator;
pub use translate::{DEFAULT_TTS_URL, TranslateTtsNarrator};

/// Estimated reading time in seconds, rounded to a tenth.
///
/// Assumes five characters per word at 150 words per minute.
///
/// ```
/// assert_eq!(babel_models::estimate_duration(&"a".repeat(750)), 60.0);
/// ```
pub fn estimate_duration(text: &str) -> f32 {
    let words = text.chars().count() as f32 / 5.0;
    let seconds = words / 150.0 * 60.0;
    (seconds * 10.0).round() / 10.0
}
