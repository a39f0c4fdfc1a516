//! Story text, illustration and narration backends for BabelBooks.
//!
//! Each pipeline stage has one capability trait in `babel_interface` and several
//! swappable implementations here:
//!
//! | Stage | Primary | Fallback / mock |
//! |-------|---------|-----------------|
//! | Text | [`GeminiStoryWriter`] | [`TemplateStoryWriter`] |
//! | Images | [`ImagenIllustrator`] behind [`BatchingIllustrator`] | [`PlaceholderIllustrator`] |
//! | Narration | [`GeminiNarrator`] | [`TranslateTtsNarrator`], then [`ToneNarrator`] |
//!
//! [`Generators::from_settings`] picks implementations once at startup from
//! [`GeneratorSettings`]; nothing downstream inspects configuration flags.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audio;
mod factory;
mod gemini;
mod image;
mod retry;
mod story;

pub use audio::{
    DEFAULT_TTS_URL, FallbackNarrator, GeminiNarrator, MixingNarrator, ToneNarrator,
    TranslateTtsNarrator, estimate_duration, mp3, wav,
};
pub use factory::{GeneratorSettings, GeneratorSettingsBuilder, Generators};
pub use gemini::{DEFAULT_BASE_URL, GeminiRestClient};
pub use image::{
    BatchingIllustrator, ImagenIllustrator, PlaceholderIllustrator, png, placeholder_image,
};
pub use retry::{RetryPolicy, with_retry};
pub use story::{GeminiStoryWriter, TemplateStoryWriter, build_story_prompt, parse_story};
