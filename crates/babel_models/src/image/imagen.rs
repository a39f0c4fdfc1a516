//! Imagen-backed illustrator.

use crate::GeminiRestClient;
use crate::gemini::{ImagenInstance, ImagenParameters, PredictRequest, PredictResponse};
use async_trait::async_trait;
use babel_core::ImageAsset;
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::{ImageRequest, Illustrator, StoryContext};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, instrument, warn};

/// Story text included in batch prompts for continuity.
const CONTEXT_CHARS: usize = 1000;

/// Illustrates pages with an Imagen model.
///
/// A batch call asks for one image per page in a single prediction; Imagen caps
/// samples per call, so callers should chunk by [`Illustrator::max_batch_size`].
#[derive(Debug, Clone)]
pub struct ImagenIllustrator {
    client: GeminiRestClient,
    model: String,
    max_batch: usize,
}

impl ImagenIllustrator {
    /// Create an illustrator; `max_batch` is clamped to 1..=4.
    pub fn new(client: GeminiRestClient, model: impl Into<String>, max_batch: usize) -> Self {
        Self {
            client,
            model: model.into(),
            max_batch: max_batch.clamp(1, 4),
        }
    }

    fn page_prompt(request: &ImageRequest, context: &StoryContext) -> String {
        format!(
            "{prompt}\n\nThis illustrates page {page} of the children's story \"{title}\". \
             Use a {style} style, bright and age-appropriate for {age}. \
             Contain no text or words.",
            prompt = request.prompt,
            page = request.page_number,
            title = context.title(),
            style = context.art_style(),
            age = context.age_group(),
        )
    }

    fn batch_prompt(requests: &[ImageRequest], context: &StoryContext) -> String {
        let first = requests.first().map(|r| r.page_number).unwrap_or(1);
        let last = requests.last().map(|r| r.page_number).unwrap_or(first);
        let excerpt: String = context.full_text().chars().take(CONTEXT_CHARS).collect();
        let pages = requests
            .iter()
            .map(|r| format!("Page {}: {}\nScene: {}", r.page_number, r.text, r.prompt))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"Create {count} distinct illustrations for pages {first} to {last} of a children's story titled "{title}".

STORY CONTEXT (for consistency):
{excerpt}...

PAGES TO ILLUSTRATE IN THIS BATCH:
{pages}

INSTRUCTIONS:
Generate {count} separate images, one for each page listed above. Each image should:
1. Illustrate the specific events described in its corresponding page
2. Maintain consistent character appearances with any previous illustrations
3. Use the same {style} artistic style
4. Share a cohesive color palette for visual continuity
5. Be bright, colorful, and age-appropriate for {age}
6. Contain NO text or words - only visual storytelling"#,
            count = requests.len(),
            title = context.title(),
            style = context.art_style(),
            age = context.age_group(),
        )
    }

    async fn predict(&self, prompt: String, count: usize) -> Result<Vec<ImageAsset>, GenerationError> {
        let body = PredictRequest {
            instances: vec![ImagenInstance { prompt }],
            parameters: ImagenParameters::for_children(count as u32),
        };
        let response: PredictResponse = self.client.call_model(&self.model, "predict", &body).await?;

        let mut images = Vec::with_capacity(response.predictions.len());
        for prediction in response.predictions {
            let Some(encoded) = prediction.bytes_base64_encoded else {
                warn!("Prediction carried no image bytes, likely filtered");
                continue;
            };
            let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                GenerationError::new(GenerationErrorKind::Base64Decode(e.to_string()))
            })?;
            let format = prediction
                .mime_type
                .as_deref()
                .and_then(|mime| mime.strip_prefix("image/"))
                .unwrap_or("png")
                .to_string();
            images.push(ImageAsset::generated(bytes, format));
        }

        if images.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::Image(
                "no images returned".to_string(),
            )));
        }
        Ok(images)
    }
}

#[async_trait]
impl Illustrator for ImagenIllustrator {
    #[instrument(skip(self, request, context), fields(page = request.page_number))]
    async fn illustrate(
        &self,
        request: &ImageRequest,
        context: &StoryContext,
    ) -> BabelResult<ImageAsset> {
        let mut images = self.predict(Self::page_prompt(request, context), 1).await?;
        debug!(count = images.len(), "Received page image");
        Ok(images.swap_remove(0))
    }

    /// May return fewer images than requested when some were filtered.
    #[instrument(skip(self, requests, context), fields(count = requests.len()))]
    async fn illustrate_batch(
        &self,
        requests: &[ImageRequest],
        context: &StoryContext,
    ) -> BabelResult<Vec<ImageAsset>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let images = self
            .predict(Self::batch_prompt(requests, context), requests.len())
            .await?;
        info!(requested = requests.len(), received = images.len(), "Generated image batch");
        Ok(images)
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch
    }

    fn backend_name(&self) -> &'static str {
        "imagen"
    }
}
