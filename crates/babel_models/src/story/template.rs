//! Offline story writer used when text generation is mocked.

use async_trait::async_trait;
use babel_core::{GeneratedPage, GeneratedStory, JobRequest, StoryMetadata};
use babel_error::BabelResult;
use babel_interface::StoryWriter;

/// Deterministic writer that fills the age band's page count from templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateStoryWriter;

impl TemplateStoryWriter {
    /// Create a writer.
    pub fn new() -> Self {
        Self
    }
}

const BEATS: [&str; 6] = [
    "wakes up to a bright morning",
    "meets a new friend along the path",
    "finds something surprising",
    "learns to share and take turns",
    "helps a friend who needs it",
    "heads home happy and sleepy",
];

#[async_trait]
impl StoryWriter for TemplateStoryWriter {
    async fn write(&self, request: &JobRequest) -> BabelResult<GeneratedStory> {
        let age_group = request.age_group();
        let pages = age_group.profile().pages;
        let hero = request
            .child_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| request.prompt.clone());

        let pages = (1..=pages)
            .map(|n| {
                let beat = BEATS[(n as usize - 1) % BEATS.len()];
                GeneratedPage {
                    page_number: n,
                    text: format!("On page {n}, {hero} {beat}."),
                    image_prompt: format!("{} {beat}", request.prompt),
                    interactive_element: (n % 2 == 0).then(|| "Can you clap your hands?".to_string()),
                    narrator_note: Some(format!("Read in a {} voice", request.tone)),
                }
            })
            .collect::<Vec<_>>();

        Ok(GeneratedStory {
            title: format!("The Story of {}", request.prompt),
            metadata: StoryMetadata {
                age_group: age_group.label().to_string(),
                tone: request.tone.clone(),
                language: request.text_language.clone(),
                page_count: pages.len() as u32,
            },
            pages,
        })
    }

    fn backend_name(&self) -> &'static str {
        "template"
    }
}
