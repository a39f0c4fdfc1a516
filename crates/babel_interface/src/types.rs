//! Request types passed to the generator traits.

use babel_core::{AgeGroup, GeneratedStory, JobRequest};
use serde::{Deserialize, Serialize};

/// Story-wide context given to the illustrator for visual continuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StoryContext {
    /// Story title
    title: String,
    /// Target age band
    age_group: AgeGroup,
    /// "Page N: text" lines for every page, joined by blank lines
    full_text: String,
}

impl StoryContext {
    /// Build context from a generated story.
    pub fn from_story(story: &GeneratedStory, age_group: AgeGroup) -> Self {
        let full_text = story
            .pages
            .iter()
            .map(|page| format!("Page {}: {}", page.page_number, page.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            title: story.title.clone(),
            age_group,
            full_text,
        }
    }

    /// Art style for the age band.
    pub fn art_style(&self) -> &'static str {
        self.age_group.profile().art_style
    }
}

/// One page to illustrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// 1-based page number
    pub page_number: u32,
    /// Page text
    pub text: String,
    /// Illustration prompt, already passed through the safety transform
    pub prompt: String,
}

/// One page to narrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationRequest {
    /// 1-based page number
    pub page_number: u32,
    /// Text to speak
    pub text: String,
    /// Narration language name, e.g. "English"
    pub language: String,
    /// Story tone label
    pub tone: String,
    /// Age band driving speech rate and pitch
    pub age_group: AgeGroup,
    /// Interaction hint; when present a short cue is appended
    pub interactive_element: Option<String>,
}

impl NarrationRequest {
    /// Narration request for a page of a job.
    pub fn for_page(
        request: &JobRequest,
        page_number: u32,
        text: impl Into<String>,
        interactive_element: Option<String>,
    ) -> Self {
        Self {
            page_number,
            text: text.into(),
            language: request.narration_language().to_string(),
            tone: request.tone.clone(),
            age_group: request.age_group(),
            interactive_element,
        }
    }
}
