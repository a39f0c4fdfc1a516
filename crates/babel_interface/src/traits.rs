//! Capability traits for generators, the job queue and the story store.

use crate::{ImageRequest, NarrationRequest, StoryContext};
use async_trait::async_trait;
use babel_core::{
    AudioClip, GeneratedStory, ImageAsset, Job, JobCounts, JobId, JobRequest, Story, StoryId,
    StoryMetadata, StoryPage, StoryProgress, StoryStatus,
};
use babel_error::BabelResult;

/// Produces the story text.
///
/// Implementations must return exactly the page count of the request's age band,
/// numbered 1..=N, or a fatal error. Output is never repaired.
#[async_trait]
pub trait StoryWriter: Send + Sync {
    /// Write a story for the request.
    async fn write(&self, request: &JobRequest) -> BabelResult<GeneratedStory>;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Produces illustrations.
#[async_trait]
pub trait Illustrator: Send + Sync {
    /// Illustrate a single page.
    async fn illustrate(
        &self,
        request: &ImageRequest,
        context: &StoryContext,
    ) -> BabelResult<ImageAsset>;

    /// Illustrate several pages in one call, returning one image per request in order.
    ///
    /// The default issues one call per page and fails on the first error.
    async fn illustrate_batch(
        &self,
        requests: &[ImageRequest],
        context: &StoryContext,
    ) -> BabelResult<Vec<ImageAsset>> {
        let mut images = Vec::with_capacity(requests.len());
        for request in requests {
            images.push(self.illustrate(request, context).await?);
        }
        Ok(images)
    }

    /// Maximum pages per [`Illustrator::illustrate_batch`] call.
    fn max_batch_size(&self) -> usize {
        1
    }

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Produces narration audio for one page.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Narrate a page.
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip>;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// The job queue.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Atomically move the oldest pending job to processing and return it.
    ///
    /// Concurrent callers never receive the same job.
    async fn claim_next(&self) -> BabelResult<Option<Job>>;

    /// Mark a job completed.
    async fn complete_job(&self, id: JobId) -> BabelResult<()>;

    /// Mark a job failed, record the error and increment its attempt count.
    async fn fail_job(&self, id: JobId, error: &str) -> BabelResult<()>;

    /// Insert a pending job together with its pending story.
    async fn enqueue(&self, request: JobRequest) -> BabelResult<(JobId, StoryId)>;

    /// Put the story's job back to pending and reset the story.
    ///
    /// Fails if the story is already completed.
    async fn requeue_story(&self, story_id: StoryId) -> BabelResult<JobId>;

    /// Count jobs by status.
    async fn count_by_status(&self) -> BabelResult<JobCounts>;

    /// Check connectivity.
    async fn ping(&self) -> BabelResult<()>;
}

/// The story document store.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Write a status transition, optionally with progress and an error summary.
    async fn update_status(
        &self,
        id: StoryId,
        status: StoryStatus,
        progress: Option<StoryProgress>,
        error: Option<&str>,
    ) -> BabelResult<()>;

    /// Upsert title, metadata and total page count with an empty page list,
    /// set status `generating_assets` and flag the text as generated.
    async fn save_metadata(
        &self,
        id: StoryId,
        title: &str,
        metadata: &StoryMetadata,
        total_pages: u32,
    ) -> BabelResult<()>;

    /// Save a page, replacing any page with the same number, and advance progress.
    ///
    /// The page number must lie within the total stored by `save_metadata`;
    /// a story without metadata accepts no pages.
    async fn save_page(&self, id: StoryId, page: &StoryPage) -> BabelResult<()>;

    /// Set status `completed` and the completion time.
    async fn mark_completed(&self, id: StoryId) -> BabelResult<()>;

    /// Load a story document.
    async fn get_story(&self, id: StoryId) -> BabelResult<Option<Story>>;
}
