//! Gemini speech synthesis.

use super::wav::{Pcm, SAMPLE_RATE, rate_from_mime};
use crate::GeminiRestClient;
use crate::gemini::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, PrebuiltVoiceConfig,
    SpeechConfig, VoiceConfig,
};
use async_trait::async_trait;
use babel_core::AudioClip;
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::{NarrationRequest, Narrator};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, instrument};

/// Narrates with a Gemini TTS model. Raw PCM responses are wrapped as WAV.
#[derive(Debug, Clone)]
pub struct GeminiNarrator {
    client: GeminiRestClient,
    model: String,
    voice_name: String,
}

impl GeminiNarrator {
    /// Create a narrator using the default storyteller voice.
    pub fn new(client: GeminiRestClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            voice_name: "Kore".to_string(),
        }
    }

    fn prompt(request: &NarrationRequest) -> String {
        let voice = request.age_group.voice();
        format!(
            "Read this children's story text aloud in {language}.\n\
             Voice style: {style}, {rate} pace, {emphasis} emphasis.\n\
             Text to narrate: {text}",
            language = request.language,
            style = voice.voice_style,
            rate = voice.rate,
            emphasis = voice.emphasis,
            text = request.text,
        )
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    #[instrument(skip(self, request), fields(page = request.page_number, language = %request.language))]
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip> {
        let body = GenerateContentRequest::from_text(
            Self::prompt(request),
            GenerationConfig {
                temperature: Some(0.7),
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice_name.clone(),
                        },
                    },
                }),
                ..Default::default()
            },
        );

        let response: GenerateContentResponse = self
            .client
            .call_model(&self.model, "generateContent", &body)
            .await?;
        let inline = response.inline_data().ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::UnexpectedResponse(
                "no audio data in TTS response".to_string(),
            ))
        })?;
        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| GenerationError::new(GenerationErrorKind::Base64Decode(e.to_string())))?;

        let pcm = if bytes.starts_with(b"RIFF") {
            Pcm::from_wav(&bytes)?
        } else {
            let rate = rate_from_mime(&inline.mime_type).unwrap_or(SAMPLE_RATE);
            Pcm::from_le_bytes(rate, &bytes)
        };
        if pcm.samples.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::Audio(
                "empty audio in TTS response".to_string(),
            ))
            .into());
        }

        info!(mime = %inline.mime_type, seconds = pcm.duration_secs(), "Generated narration with Gemini TTS");
        Ok(AudioClip {
            duration_secs: pcm.duration_secs(),
            bytes: pcm.to_wav(),
            format: "wav".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "gemini-tts"
    }
}
