//! Background bed and interaction cue mixing.

use super::{mp3, wav::Pcm};
use async_trait::async_trait;
use babel_core::{AudioClip, Tone};
use babel_error::BabelResult;
use babel_interface::{NarrationRequest, Narrator};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Cue appended after pages with an interactive element.
const CUE_HZ: f32 = 880.0;
const CUE_SECS: f32 = 0.2;
const CUE_GAIN_DB: f32 = -10.0;

/// Wraps a narrator and mixes a tone-appropriate background bed under its output,
/// appending a short cue when the page has an interactive element.
///
/// WAV and MP3 narration is decoded, mixed and returned as WAV. Other formats,
/// and MP3 that fails to decode, pass through unchanged.
#[derive(Clone)]
pub struct MixingNarrator {
    inner: Arc<dyn Narrator>,
}

impl MixingNarrator {
    /// Wrap a narrator.
    pub fn new(inner: Arc<dyn Narrator>) -> Self {
        Self { inner }
    }

    /// Mix bed and cue into a PCM track.
    pub fn mix(narration: &mut Pcm, tone: Tone, add_cue: bool) {
        let soundscape = tone.soundscape();
        let bed = Pcm::sine(
            narration.sample_rate,
            soundscape.frequency_hz,
            1.0,
            -soundscape.attenuation_db,
        );
        narration.overlay_looped(&bed);
        if add_cue {
            narration.append(&Pcm::sine(narration.sample_rate, CUE_HZ, CUE_SECS, CUE_GAIN_DB));
        }
    }
}

impl std::fmt::Debug for MixingNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixingNarrator")
            .field("inner", &self.inner.backend_name())
            .finish()
    }
}

#[async_trait]
impl Narrator for MixingNarrator {
    #[instrument(skip(self, request), fields(page = request.page_number, inner = self.inner.backend_name()))]
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip> {
        let clip = self.inner.narrate(request).await?;
        let format = clip.format.clone();
        let mut pcm = match format.as_str() {
            "wav" => Pcm::from_wav(&clip.bytes)?,
            "mp3" => match mp3::decode(&clip.bytes) {
                Ok(pcm) => pcm,
                Err(e) => {
                    warn!(error = %e, "Narration left unmixed");
                    return Ok(clip);
                }
            },
            other => {
                debug!(format = other, "Skipping background mix");
                return Ok(clip);
            }
        };
        let add_cue = request
            .interactive_element
            .as_deref()
            .is_some_and(|element| !element.trim().is_empty());
        Self::mix(&mut pcm, Tone::from_label(&request.tone), add_cue);
        debug!(tone = %request.tone, add_cue, "Mixed background bed");

        Ok(AudioClip {
            duration_secs: pcm.duration_secs(),
            bytes: pcm.to_wav(),
            format: "wav".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
