//! Baseline narration through the public Google Translate speech endpoint.

use super::{mp3, wav::Pcm};
use crate::{RetryPolicy, with_retry};
use async_trait::async_trait;
use babel_core::{AudioClip, SpeechRate, speech_language_code};
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::{NarrationRequest, Narrator};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument};

/// Default speech endpoint.
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// The endpoint rejects long inputs, so text is sent in word-aligned pieces.
const MAX_CHUNK_CHARS: usize = 100;

/// Playback speed-up applied for voices that call for a raised pitch.
const HIGH_PITCH_FACTOR: f32 = 1.1;

/// Narrator backed by the Translate TTS endpoint.
///
/// The endpoint answers with MP3, which is decoded so the voice profile can
/// be applied; output is WAV with an exact duration.
#[derive(Debug, Clone)]
pub struct TranslateTtsNarrator {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl TranslateTtsNarrator {
    /// Create a narrator for an endpoint.
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::ClientCreation(e.to_string())))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry,
        })
    }

    async fn fetch_chunk(
        &self,
        text: &str,
        language: &str,
        slow: bool,
    ) -> Result<Vec<u8>, GenerationError> {
        let speed = if slow { "0.3" } else { "1" };
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("ttsspeed", speed),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| GenerationError::new(GenerationErrorKind::Request(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::new(GenerationErrorKind::Http {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::new(GenerationErrorKind::Request(e.to_string())))?;
        Ok(bytes.to_vec())
    }
}

/// Decode fetched speech and apply the voice profile's pitch.
pub(crate) fn to_speech(bytes: &[u8], high_pitch: bool) -> Result<Pcm, GenerationError> {
    let mut pcm = mp3::decode(bytes)?;
    if high_pitch {
        pcm.raise_pitch(HIGH_PITCH_FACTOR);
    }
    Ok(pcm)
}

/// Split text into pieces of at most `max_chars` characters on word boundaries.
pub(crate) fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl Narrator for TranslateTtsNarrator {
    #[instrument(skip(self, request), fields(page = request.page_number, language = %request.language))]
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip> {
        let language = speech_language_code(&request.language);
        let voice = request.age_group.voice();
        let slow = voice.rate == SpeechRate::Slow;
        let chunks = chunk_text(&request.text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::Audio(
                "no text to narrate".to_string(),
            ))
            .into());
        }

        // MP3 frames concatenate cleanly.
        let mut bytes = Vec::new();
        for chunk in &chunks {
            let piece = with_retry(&self.retry, "translate_tts", || {
                self.fetch_chunk(chunk, language, slow)
            })
            .await?;
            bytes.extend(piece);
        }

        let pcm = to_speech(&bytes, voice.high_pitch)?;
        info!(
            chunks = chunks.len(),
            seconds = pcm.duration_secs(),
            "Generated narration with Translate TTS"
        );
        Ok(AudioClip {
            duration_secs: pcm.duration_secs(),
            bytes: pcm.to_wav(),
            format: "wav".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "translate-tts"
    }
}
