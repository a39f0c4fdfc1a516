//! Offline synthesized narration.

use super::estimate_duration;
use super::wav::{Pcm, SAMPLE_RATE};
use async_trait::async_trait;
use babel_core::AudioClip;
use babel_error::BabelResult;
use babel_interface::{NarrationRequest, Narrator};

/// Narrator that renders a soft tone lasting as long as the text would take to read.
///
/// Used when narration is mocked; the output is valid WAV with a positive duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneNarrator;

impl ToneNarrator {
    /// Create a narrator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Narrator for ToneNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip> {
        let seconds = estimate_duration(&request.text).max(1.0);
        let frequency = if request.age_group.voice().high_pitch { 484.0 } else { 440.0 };
        let pcm = Pcm::sine(SAMPLE_RATE, frequency, seconds, -18.0);
        Ok(AudioClip {
            duration_secs: pcm.duration_secs(),
            bytes: pcm.to_wav(),
            format: "wav".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "tone"
    }
}
