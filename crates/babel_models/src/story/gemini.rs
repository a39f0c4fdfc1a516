//! Gemini-backed story writer.

use crate::gemini::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::{GeminiRestClient, build_story_prompt, parse_story};
use async_trait::async_trait;
use babel_core::{GeneratedStory, JobRequest};
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::StoryWriter;
use tracing::{info, instrument};

/// Writes stories with a Gemini text model in JSON mode.
#[derive(Debug, Clone)]
pub struct GeminiStoryWriter {
    client: GeminiRestClient,
    model: String,
}

impl GeminiStoryWriter {
    /// Create a writer for a model.
    pub fn new(client: GeminiRestClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl StoryWriter for GeminiStoryWriter {
    #[instrument(skip(self, request), fields(model = %self.model, age = %request.child_age))]
    async fn write(&self, request: &JobRequest) -> BabelResult<GeneratedStory> {
        let body = GenerateContentRequest::from_text(
            build_story_prompt(request),
            GenerationConfig {
                temperature: Some(0.9),
                max_output_tokens: Some(8192),
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            },
        );

        let response: GenerateContentResponse = self
            .client
            .call_model(&self.model, "generateContent", &body)
            .await?;

        let text = response.text().ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::UnexpectedResponse(
                "no text in response".to_string(),
            ))
        })?;

        let story = parse_story(&text, request)?;
        info!(title = %story.title, pages = story.pages.len(), "Generated story");
        Ok(story)
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}
