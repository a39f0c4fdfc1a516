//! In-process job queue and story store.
//!
//! Mirrors the semantics of [`PostgresStore`](crate::PostgresStore) behind a
//! single lock: claims are atomic, completed stories are frozen and pages are
//! upserted by number. Used by tests and local experiments.

use async_trait::async_trait;
use babel_core::{
    Job, JobCounts, JobId, JobRequest, JobStatus, Story, StoryBody, StoryId, StoryMetadata,
    StoryPage, StoryProgress, StoryStatus,
};
use babel_error::{BabelResult, PipelineError, PipelineErrorKind};
use babel_interface::{JobQueue, StoryStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct JobEntry {
    id: JobId,
    story_id: StoryId,
    status: JobStatus,
    data: JobRequest,
    attempts: u32,
    error: Option<String>,
    created_at: DateTime<Utc>,
    sequence: u64,
}

impl JobEntry {
    fn to_job(&self) -> Job {
        Job::new(
            self.id,
            self.story_id,
            self.status,
            self.data.clone(),
            self.attempts,
            self.error.clone(),
            self.created_at,
        )
    }
}

#[derive(Debug, Clone)]
struct StoryEntry {
    status: StoryStatus,
    progress: Option<StoryProgress>,
    title: Option<String>,
    metadata: Option<StoryMetadata>,
    total_pages: Option<u32>,
    pages: BTreeMap<u32, StoryPage>,
    text_generated: bool,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl StoryEntry {
    fn pending(now: DateTime<Utc>) -> Self {
        Self {
            status: StoryStatus::Pending,
            progress: None,
            title: None,
            metadata: None,
            total_pages: None,
            pages: BTreeMap::new(),
            text_generated: false,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn to_story(&self, id: StoryId) -> Story {
        Story::new(
            id,
            self.status,
            self.progress.clone(),
            StoryBody {
                title: self.title.clone(),
                metadata: self.metadata.clone(),
                pages: self.pages.values().cloned().collect(),
                total_pages: self.total_pages,
            },
            self.text_generated,
            self.error.clone(),
            self.created_at,
            self.updated_at,
            self.completed_at,
        )
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    jobs: HashMap<JobId, JobEntry>,
    stories: HashMap<StoryId, StoryEntry>,
    next_sequence: u64,
}

impl MemoryState {
    fn writable_story(&mut self, id: StoryId) -> BabelResult<&mut StoryEntry> {
        let story = self
            .stories
            .get_mut(&id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::StoryNotFound(id.to_string())))?;
        if story.status == StoryStatus::Completed {
            return Err(PipelineError::new(PipelineErrorKind::StoryCompleted(id.to_string())).into());
        }
        Ok(story)
    }

    fn job_mut(&mut self, id: JobId) -> BabelResult<&mut JobEntry> {
        self.jobs
            .get_mut(&id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::JobNotFound(id.to_string())).into())
    }
}

/// Job queue and story store held in process memory.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a job.
    pub fn job(&self, id: JobId) -> Option<Job> {
        self.state.lock().jobs.get(&id).map(JobEntry::to_job)
    }

    /// Snapshot of a story.
    pub fn story(&self, id: StoryId) -> Option<Story> {
        self.state.lock().stories.get(&id).map(|s| s.to_story(id))
    }

    /// Snapshots of every job, oldest first.
    pub fn jobs(&self) -> Vec<Job> {
        let state = self.state.lock();
        let mut entries: Vec<&JobEntry> = state.jobs.values().collect();
        entries.sort_by_key(|entry| (entry.created_at, entry.sequence));
        entries.into_iter().map(JobEntry::to_job).collect()
    }
}

#[async_trait]
impl JobQueue for InMemoryStore {
    async fn claim_next(&self) -> BabelResult<Option<Job>> {
        let mut state = self.state.lock();
        let next = state
            .jobs
            .values_mut()
            .filter(|entry| entry.status == JobStatus::Pending)
            .min_by_key(|entry| (entry.created_at, entry.sequence));
        Ok(next.map(|entry| {
            entry.status = JobStatus::Processing;
            entry.to_job()
        }))
    }

    async fn complete_job(&self, id: JobId) -> BabelResult<()> {
        let mut state = self.state.lock();
        state.job_mut(id)?.status = JobStatus::Completed;
        Ok(())
    }

    async fn fail_job(&self, id: JobId, error: &str) -> BabelResult<()> {
        let mut state = self.state.lock();
        let entry = state.job_mut(id)?;
        entry.status = JobStatus::Failed;
        entry.error = Some(error.to_string());
        entry.attempts += 1;
        Ok(())
    }

    async fn enqueue(&self, request: JobRequest) -> BabelResult<(JobId, StoryId)> {
        let job_id = JobId::new();
        let story_id = StoryId::new();
        let now = Utc::now();
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.stories.insert(story_id, StoryEntry::pending(now));
        state.jobs.insert(
            job_id,
            JobEntry {
                id: job_id,
                story_id,
                status: JobStatus::Pending,
                data: request,
                attempts: 0,
                error: None,
                created_at: now,
                sequence,
            },
        );
        Ok((job_id, story_id))
    }

    async fn requeue_story(&self, story_id: StoryId) -> BabelResult<JobId> {
        let mut state = self.state.lock();
        let created_at = state.writable_story(story_id)?.created_at;
        let job = state
            .jobs
            .values_mut()
            .filter(|entry| entry.story_id == story_id)
            .max_by_key(|entry| (entry.created_at, entry.sequence))
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::JobNotFound(format!(
                    "no job for story {story_id}"
                )))
            })?;
        job.status = JobStatus::Pending;
        job.error = None;
        let job_id = job.id;
        let mut reset = StoryEntry::pending(Utc::now());
        reset.created_at = created_at;
        state.stories.insert(story_id, reset);
        Ok(job_id)
    }

    async fn count_by_status(&self) -> BabelResult<JobCounts> {
        let state = self.state.lock();
        let mut counts = JobCounts::default();
        for entry in state.jobs.values() {
            counts.record(entry.status);
        }
        Ok(counts)
    }

    async fn ping(&self) -> BabelResult<()> {
        Ok(())
    }
}

#[async_trait]
impl StoryStore for InMemoryStore {
    async fn update_status(
        &self,
        id: StoryId,
        status: StoryStatus,
        progress: Option<StoryProgress>,
        error: Option<&str>,
    ) -> BabelResult<()> {
        let mut state = self.state.lock();
        let story = state.writable_story(id)?;
        let now = Utc::now();
        story.status = status;
        if let Some(progress) = progress {
            story.progress = Some(progress);
        }
        if let Some(error) = error {
            story.error = Some(error.to_string());
        }
        if status == StoryStatus::Completed {
            story.completed_at = Some(now);
        }
        story.updated_at = now;
        Ok(())
    }

    async fn save_metadata(
        &self,
        id: StoryId,
        title: &str,
        metadata: &StoryMetadata,
        total_pages: u32,
    ) -> BabelResult<()> {
        let mut state = self.state.lock();
        let now = Utc::now();
        if state
            .stories
            .get(&id)
            .is_some_and(|existing| existing.status == StoryStatus::Completed)
        {
            return Err(PipelineError::new(PipelineErrorKind::StoryCompleted(id.to_string())).into());
        }
        let story = state
            .stories
            .entry(id)
            .or_insert_with(|| StoryEntry::pending(now));
        story.status = StoryStatus::GeneratingAssets;
        story.progress = Some(StoryProgress::of_total(total_pages));
        story.title = Some(title.to_string());
        story.metadata = Some(metadata.clone());
        story.total_pages = Some(total_pages);
        story.pages.clear();
        story.text_generated = true;
        story.updated_at = now;
        Ok(())
    }

    async fn save_page(&self, id: StoryId, page: &StoryPage) -> BabelResult<()> {
        let mut state = self.state.lock();
        let story = state.writable_story(id)?;
        let total_pages = story
            .total_pages
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::MetadataMissing(id.to_string())))?;
        if page.page_number == 0 || page.page_number > total_pages {
            return Err(PipelineError::new(PipelineErrorKind::PageOutOfRange {
                page: page.page_number,
                total: total_pages,
            })
            .into());
        }
        story.pages.insert(page.page_number, page.clone());
        story.progress = Some(StoryProgress {
            current_page: Some(page.page_number),
            total_pages: Some(total_pages),
            completed_pages: story.pages.keys().copied().collect(),
        });
        story.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_completed(&self, id: StoryId) -> BabelResult<()> {
        let mut state = self.state.lock();
        let story = state
            .stories
            .get_mut(&id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::StoryNotFound(id.to_string())))?;
        if story.status != StoryStatus::Completed {
            let now = Utc::now();
            story.status = StoryStatus::Completed;
            story.completed_at = Some(now);
            story.updated_at = now;
        }
        Ok(())
    }

    async fn get_story(&self, id: StoryId) -> BabelResult<Option<Story>> {
        Ok(self.story(id))
    }
}
