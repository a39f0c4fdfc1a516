//! Backend selection.

use crate::{
    BatchingIllustrator, DEFAULT_BASE_URL, DEFAULT_TTS_URL, FallbackNarrator, GeminiNarrator,
    GeminiRestClient, GeminiStoryWriter, ImagenIllustrator, MixingNarrator, PlaceholderIllustrator,
    RetryPolicy, TemplateStoryWriter, ToneNarrator, TranslateTtsNarrator,
};
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::{Illustrator, Narrator, StoryWriter};
use std::sync::Arc;
use tracing::info;

/// Everything needed to choose and build generator backends.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into))]
pub struct GeneratorSettings {
    /// API key for Gemini and Imagen; required unless every stage is mocked
    #[builder(default)]
    pub gemini_api_key: Option<String>,
    /// Generative Language API root
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    pub gemini_base_url: String,
    /// Text model
    #[builder(default = "\"gemini-2.0-flash\".to_string()")]
    pub text_model: String,
    /// Image model
    #[builder(default = "\"imagen-4.0-generate-001\".to_string()")]
    pub image_model: String,
    /// Speech model
    #[builder(default = "\"gemini-2.5-flash-preview-tts\".to_string()")]
    pub tts_model: String,
    /// Baseline speech endpoint
    #[builder(default = "DEFAULT_TTS_URL.to_string()")]
    pub tts_fallback_url: String,
    /// Use the template writer
    #[builder(default)]
    pub use_mock_stories: bool,
    /// Use placeholder images
    #[builder(default)]
    pub use_mock_images: bool,
    /// Use synthesized tones for narration
    #[builder(default)]
    pub use_mock_audio: bool,
    /// Mix a background bed into baseline narration
    #[builder(default = "true")]
    pub enable_background_music: bool,
    /// Imagen samples per call
    #[builder(default = "4")]
    pub max_images_per_batch: usize,
    /// Retry behaviour for backend calls
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl GeneratorSettings {
    /// Creates a new builder.
    pub fn builder() -> GeneratorSettingsBuilder {
        GeneratorSettingsBuilder::default()
    }

    /// True if every stage uses an offline backend.
    pub fn all_mocked(&self) -> bool {
        self.use_mock_stories && self.use_mock_images && self.use_mock_audio
    }
}

/// The three generator backends the coordinator drives.
#[derive(Clone)]
pub struct Generators {
    /// Story text
    pub writer: Arc<dyn StoryWriter>,
    /// Illustrations
    pub illustrator: Arc<dyn Illustrator>,
    /// Narration
    pub narrator: Arc<dyn Narrator>,
}

impl std::fmt::Debug for Generators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generators")
            .field("writer", &self.writer.backend_name())
            .field("illustrator", &self.illustrator.backend_name())
            .field("narrator", &self.narrator.backend_name())
            .finish()
    }
}

impl Generators {
    /// Assemble from explicit backends.
    pub fn new(
        writer: Arc<dyn StoryWriter>,
        illustrator: Arc<dyn Illustrator>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            writer,
            illustrator,
            narrator,
        }
    }

    /// Offline backends for every stage.
    pub fn mocked(enable_background_music: bool) -> Self {
        let tone: Arc<dyn Narrator> = Arc::new(ToneNarrator::new());
        let narrator: Arc<dyn Narrator> = if enable_background_music {
            Arc::new(MixingNarrator::new(tone))
        } else {
            tone
        };
        Self::new(
            Arc::new(TemplateStoryWriter::new()),
            Arc::new(PlaceholderIllustrator::new()),
            narrator,
        )
    }

    /// Baseline narration used when premium speech fails.
    ///
    /// Translate TTS first, then a synthesized tone, with the background bed
    /// mixed over whichever answers when music is enabled.
    pub fn baseline_narrator(settings: &GeneratorSettings) -> BabelResult<Arc<dyn Narrator>> {
        let chain: Arc<dyn Narrator> = Arc::new(FallbackNarrator::new(vec![
            Arc::new(TranslateTtsNarrator::new(
                &settings.tts_fallback_url,
                settings.retry,
            )?),
            Arc::new(ToneNarrator::new()),
        ]));
        Ok(if settings.enable_background_music {
            Arc::new(MixingNarrator::new(chain))
        } else {
            chain
        })
    }

    /// Choose backends per stage.
    ///
    /// # Errors
    ///
    /// Returns an error if a real backend is selected without an API key, or an HTTP
    /// client cannot be built.
    pub fn from_settings(settings: &GeneratorSettings) -> BabelResult<Self> {
        let client = if settings.all_mocked() {
            None
        } else {
            let key = settings.gemini_api_key.clone().ok_or_else(|| {
                GenerationError::new(GenerationErrorKind::MissingCredentials(
                    "GEMINI_API_KEY".to_string(),
                ))
            })?;
            Some(GeminiRestClient::new(key, &settings.gemini_base_url, settings.retry)?)
        };

        let writer: Arc<dyn StoryWriter> = match (&client, settings.use_mock_stories) {
            (Some(client), false) => {
                Arc::new(GeminiStoryWriter::new(client.clone(), &settings.text_model))
            }
            _ => Arc::new(TemplateStoryWriter::new()),
        };

        let illustrator: Arc<dyn Illustrator> = match (&client, settings.use_mock_images) {
            (Some(client), false) => Arc::new(BatchingIllustrator::new(Arc::new(
                ImagenIllustrator::new(
                    client.clone(),
                    &settings.image_model,
                    settings.max_images_per_batch,
                ),
            ))),
            _ => Arc::new(PlaceholderIllustrator::new()),
        };

        let narrator: Arc<dyn Narrator> = match (&client, settings.use_mock_audio) {
            (Some(client), false) => {
                let baseline = Self::baseline_narrator(settings)?;
                Arc::new(FallbackNarrator::new(vec![
                    Arc::new(GeminiNarrator::new(client.clone(), &settings.tts_model)),
                    baseline,
                ]))
            }
            _ => {
                let tone: Arc<dyn Narrator> = Arc::new(ToneNarrator::new());
                if settings.enable_background_music {
                    Arc::new(MixingNarrator::new(tone))
                } else {
                    tone
                }
            }
        };

        let generators = Self::new(writer, illustrator, narrator);
        info!(
            writer = generators.writer.backend_name(),
            illustrator = generators.illustrator.backend_name(),
            narrator = generators.narrator.backend_name(),
            "Selected generator backends"
        );
        Ok(generators)
    }
}
