//! Job queue records.

use crate::{AgeGroup, JobId, StoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a queued job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
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
pub enum JobStatus {
    /// Waiting to be claimed
    #[display("pending")]
    Pending,
    /// Claimed by exactly one coordinator
    #[display("processing")]
    Processing,
    /// Story fully generated
    #[display("completed")]
    Completed,
    /// Pipeline stopped with an error
    #[display("failed")]
    Failed,
}

impl JobStatus {
    /// String form stored in the database.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

fn default_child_age() -> String {
    AgeGroup::default().label().to_string()
}

fn default_tone() -> String {
    "playful".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

/// Input payload of a job, as written by the submitter.
///
/// Missing optional fields fall back to the same defaults the submitter assumes:
/// age group "3-4 years", tone "playful", language "English".
///
/// # Examples
///
/// ```
/// use babel_core::{AgeGroup, JobRequest};
///
/// let request: JobRequest = serde_json::from_str(r#"{"prompt": "a curious fox"}"#).unwrap();
/// assert_eq!(request.age_group(), AgeGroup::ThreeToFourYears);
/// assert_eq!(request.narration_language(), "English");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct JobRequest {
    /// Free-text story prompt
    pub prompt: String,
    /// Age band label, e.g. "3-4 years"
    #[serde(default = "default_child_age")]
    #[builder(default = "default_child_age()")]
    pub child_age: String,
    /// Story tone, e.g. "wholesome"
    #[serde(default = "default_tone")]
    #[builder(default = "default_tone()")]
    pub tone: String,
    /// Language of the story text
    #[serde(default = "default_language")]
    #[builder(default = "default_language()")]
    pub text_language: String,
    /// Language of the narration, defaults to the text language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub narration_language: Option<String>,
    /// Name of the child the story is written for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub child_name: Option<String>,
    /// Interests to weave into the story
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub child_interests: Option<String>,
}

impl JobRequest {
    /// Creates a new builder.
    pub fn builder() -> JobRequestBuilder {
        JobRequestBuilder::default()
    }

    /// Age band for this request; unknown labels fall back to the default band.
    pub fn age_group(&self) -> AgeGroup {
        self.child_age.parse().unwrap_or_default()
    }

    /// Narration language, falling back to the text language.
    pub fn narration_language(&self) -> &str {
        self.narration_language
            .as_deref()
            .unwrap_or(&self.text_language)
    }
}

/// A unit of work on the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier
    id: JobId,
    /// Story this job produces
    story_id: StoryId,
    /// Current lifecycle state
    status: JobStatus,
    /// Input payload
    data: JobRequest,
    /// Number of failed processing attempts
    attempts: u32,
    /// Cause of the last failure
    error: Option<String>,
    /// Submission time, used for oldest-first claiming
    created_at: DateTime<Utc>,
}

impl Job {
    /// Assemble a job record (used by stores when hydrating rows).
    pub fn new(
        id: JobId,
        story_id: StoryId,
        status: JobStatus,
        data: JobRequest,
        attempts: u32,
        error: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            story_id,
            status,
            data,
            attempts,
            error,
            created_at,
        }
    }
}

/// Job counts by status, reported by the metrics surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    /// Jobs waiting to be claimed
    pub pending: u64,
    /// Jobs claimed and in flight (or abandoned by a crashed worker)
    pub processing: u64,
    /// Finished jobs
    pub completed: u64,
    /// Failed jobs
    pub failed: u64,
}

impl JobCounts {
    /// Add one job in the given status.
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}
