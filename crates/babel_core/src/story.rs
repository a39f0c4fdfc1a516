//! Story records as written progressively to the store.

use crate::{PageAudio, PageImage, StoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a story document. Readers poll this to render progress.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoryStatus {
    /// Created by the submitter
    #[display("pending")]
    Pending,
    /// Claimed by a worker
    #[display("processing")]
    Processing,
    /// Waiting on the text model
    #[display("generating_text")]
    GeneratingText,
    /// Text saved, assets pending
    #[display("generating_assets")]
    GeneratingAssets,
    /// Waiting on the illustration batch
    #[display("generating_images")]
    GeneratingImages,
    /// Narrating and saving pages
    #[display("generating_audio")]
    GeneratingAudio,
    /// All pages saved
    #[display("completed")]
    Completed,
    /// Stopped with an error
    #[display("failed")]
    Failed,
}

impl StoryStatus {
    /// String form stored in the database.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// True once no further updates are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Page counters shown while a story is being built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryProgress {
    /// Page currently being worked on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    /// Total pages in the story
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    /// Page numbers already saved
    #[serde(default)]
    pub completed_pages: Vec<u32>,
}

impl StoryProgress {
    /// Progress known only by its total.
    pub fn of_total(total_pages: u32) -> Self {
        Self {
            total_pages: Some(total_pages),
            ..Self::default()
        }
    }

    /// Progress pointing at a specific page.
    pub fn at_page(current_page: u32, total_pages: u32) -> Self {
        Self {
            current_page: Some(current_page),
            total_pages: Some(total_pages),
            completed_pages: Vec::new(),
        }
    }
}

/// Descriptive metadata saved with the story text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    /// Age band label
    pub age_group: String,
    /// Tone as requested
    pub tone: String,
    /// Story text language
    pub language: String,
    /// Number of pages
    pub page_count: u32,
}

/// A page as persisted: generated text plus whichever assets were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
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
    /// Illustration, absent if none was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PageImage>,
    /// Narration, absent if narration failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<PageAudio>,
}

/// Title, metadata and pages of a story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryBody {
    /// Story title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Descriptive metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StoryMetadata>,
    /// Saved pages ordered by page number
    #[serde(default)]
    pub pages: Vec<StoryPage>,
    /// Number of pages the story will have
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// The full story document as a reader sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Story identifier
    id: StoryId,
    /// Current lifecycle state
    status: StoryStatus,
    /// Page counters
    progress: Option<StoryProgress>,
    /// Content written so far
    story: StoryBody,
    /// Set once the text has been saved
    text_generated: bool,
    /// Failure summary
    error: Option<String>,
    /// Creation time
    created_at: DateTime<Utc>,
    /// Last write time
    updated_at: DateTime<Utc>,
    /// Completion time
    completed_at: Option<DateTime<Utc>>,
}

impl Story {
    /// Assemble a story document (used by stores when hydrating rows).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: StoryId,
        status: StoryStatus,
        progress: Option<StoryProgress>,
        story: StoryBody,
        text_generated: bool,
        error: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            status,
            progress,
            story,
            text_generated,
            error,
            created_at,
            updated_at,
            completed_at,
        }
    }

    /// Page with the given number, if saved.
    pub fn page(&self, page_number: u32) -> Option<&StoryPage> {
        self.story
            .pages
            .iter()
            .find(|page| page.page_number == page_number)
    }
}
