//! Output of the text generation stage.

use crate::{StoryMetadata, StoryPage};
use serde::{Deserialize, Serialize};

/// One page of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPage {
    /// 1-based page number
    pub page_number: u32,
    /// Page text
    pub text: String,
    /// Illustration prompt
    pub image_prompt: String,
    /// Optional interaction hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_element: Option<String>,
    /// Optional reading hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator_note: Option<String>,
}

impl GeneratedPage {
    /// Text-only page ready to persist, with no assets yet.
    pub fn to_story_page(&self) -> StoryPage {
        StoryPage {
            page_number: self.page_number,
            text: self.text.clone(),
            image_prompt: self.image_prompt.clone(),
            interactive_element: self.interactive_element.clone(),
            narrator_note: self.narrator_note.clone(),
            image: None,
            audio: None,
        }
    }
}

/// A complete generated story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    /// Story title
    pub title: String,
    /// Pages numbered 1..=N
    pub pages: Vec<GeneratedPage>,
    /// Descriptive metadata
    pub metadata: StoryMetadata,
}

impl GeneratedStory {
    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// True when pages are numbered exactly 1..=N in order.
    pub fn is_sequential(&self) -> bool {
        self.pages
            .iter()
            .enumerate()
            .all(|(index, page)| page.page_number as usize == index + 1)
    }
}
