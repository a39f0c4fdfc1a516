//! Recording generator doubles and an instrumented store for coordinator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use babel_core::{
    AudioClip, GeneratedStory, ImageAsset, Job, JobCounts, JobId, JobRequest, Story, StoryId,
    StoryMetadata, StoryPage, StoryProgress, StoryStatus,
};
use babel_database::InMemoryStore;
use babel_error::{
    BabelResult, DatabaseError, DatabaseErrorKind, GenerationError, GenerationErrorKind,
    StorageError, StorageErrorKind,
};
use babel_interface::{
    ImageRequest, Illustrator, JobQueue, NarrationRequest, Narrator, StoryContext, StoryStore,
    StoryWriter,
};
use babel_models::{Generators, TemplateStoryWriter};
use babel_security::SafetyGate;
use babel_storage::{BlobMetadata, BlobReference, BlobStore};
use babel_worker::{CoordinatorSettings, ImageMode, JobCoordinator, ProgressivePersistence};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub fn request(prompt: &str) -> JobRequest {
    JobRequest::builder()
        .prompt(prompt)
        .child_age("3-4 years")
        .tone("wholesome")
        .text_language("English")
        .build()
        .expect("valid request")
}

fn unavailable(what: &str) -> GenerationError {
    GenerationError::new(GenerationErrorKind::Unavailable(what.to_string()))
}

/// What the writer double returns.
#[derive(Debug, Clone)]
pub enum WriterBehavior {
    /// Deterministic template story sized to the age band
    Template,
    /// Always fail
    Fail,
    /// This exact story
    Fixed(GeneratedStory),
}

pub struct RecordingWriter {
    behavior: WriterBehavior,
    calls: AtomicUsize,
}

impl RecordingWriter {
    pub fn new(behavior: WriterBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoryWriter for RecordingWriter {
    async fn write(&self, request: &JobRequest) -> BabelResult<GeneratedStory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            WriterBehavior::Template => TemplateStoryWriter::new().write(request).await,
            WriterBehavior::Fail => Err(unavailable("text model").into()),
            WriterBehavior::Fixed(story) => Ok(story.clone()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "recording-writer"
    }
}

pub struct RecordingIllustrator {
    fail_pages: HashSet<u32>,
    fail_batches: bool,
    calls: AtomicUsize,
    batch_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl RecordingIllustrator {
    pub fn succeeding() -> Self {
        Self::failing_pages(&[])
    }

    pub fn failing_pages(pages: &[u32]) -> Self {
        Self {
            fail_pages: pages.iter().copied().collect(),
            fail_batches: false,
            calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_batches() -> Self {
        Self {
            fail_batches: true,
            ..Self::succeeding()
        }
    }

    /// Single-page plus batch calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Illustrator for RecordingIllustrator {
    async fn illustrate(
        &self,
        request: &ImageRequest,
        _context: &StoryContext,
    ) -> BabelResult<ImageAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());
        if self.fail_pages.contains(&request.page_number) {
            return Err(unavailable("image model").into());
        }
        Ok(ImageAsset::generated(vec![0x89, b'P', b'N', b'G'], "png"))
    }

    async fn illustrate_batch(
        &self,
        requests: &[ImageRequest],
        _context: &StoryContext,
    ) -> BabelResult<Vec<ImageAsset>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .extend(requests.iter().map(|r| r.prompt.clone()));
        if self.fail_batches {
            return Err(unavailable("image batch").into());
        }
        Ok(requests
            .iter()
            .map(|_| ImageAsset::generated(vec![0x89, b'P', b'N', b'G'], "png"))
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    fn backend_name(&self) -> &'static str {
        "recording-illustrator"
    }
}

pub struct RecordingNarrator {
    fail_pages: HashSet<u32>,
    calls: AtomicUsize,
}

impl RecordingNarrator {
    pub fn succeeding() -> Self {
        Self::failing_pages(&[])
    }

    pub fn failing_pages(pages: &[u32]) -> Self {
        Self {
            fail_pages: pages.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Narrator for RecordingNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pages.contains(&request.page_number) {
            return Err(unavailable("speech").into());
        }
        Ok(AudioClip {
            bytes: vec![0; 32],
            format: "wav".to_string(),
            duration_secs: 1.5,
        })
    }

    fn backend_name(&self) -> &'static str {
        "recording-narrator"
    }
}

/// In-memory store that can fail on demand and records what readers would have seen.
#[derive(Default)]
pub struct TestStore {
    inner: InMemoryStore,
    failing_claims: AtomicUsize,
    claim_attempts: AtomicUsize,
    fail_save_metadata: AtomicBool,
    statuses: Mutex<Vec<StoryStatus>>,
    before_page_save: Mutex<Vec<Story>>,
    claim_times: Mutex<Vec<Instant>>,
    page_save_times: Mutex<Vec<Instant>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Fail the next `n` claims.
    pub fn fail_claims(&self, n: usize) {
        self.failing_claims.store(n, Ordering::SeqCst);
    }

    pub fn claim_attempts(&self) -> usize {
        self.claim_attempts.load(Ordering::SeqCst)
    }

    /// When each claim was attempted, on the runtime clock.
    pub fn claim_times(&self) -> Vec<Instant> {
        self.claim_times.lock().clone()
    }

    /// When each page save arrived, on the runtime clock.
    pub fn page_save_times(&self) -> Vec<Instant> {
        self.page_save_times.lock().clone()
    }

    pub fn fail_save_metadata(&self) {
        self.fail_save_metadata.store(true, Ordering::SeqCst);
    }

    /// Status transitions in write order.
    pub fn statuses(&self) -> Vec<StoryStatus> {
        self.statuses.lock().clone()
    }

    /// Story state observed just before each page save.
    pub fn snapshots_before_page_save(&self) -> Vec<Story> {
        self.before_page_save.lock().clone()
    }

    pub fn story(&self, id: StoryId) -> Story {
        self.inner.story(id).expect("story exists")
    }

    pub fn job(&self, id: JobId) -> Job {
        self.inner.job(id).expect("job exists")
    }
}

#[async_trait]
impl JobQueue for TestStore {
    async fn claim_next(&self) -> BabelResult<Option<Job>> {
        self.claim_attempts.fetch_add(1, Ordering::SeqCst);
        self.claim_times.lock().push(Instant::now());
        let failing = self
            .failing_claims
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "connection refused".to_string(),
            ))
            .into());
        }
        self.inner.claim_next().await
    }

    async fn complete_job(&self, id: JobId) -> BabelResult<()> {
        self.inner.complete_job(id).await
    }

    async fn fail_job(&self, id: JobId, error: &str) -> BabelResult<()> {
        self.inner.fail_job(id, error).await
    }

    async fn enqueue(&self, request: JobRequest) -> BabelResult<(JobId, StoryId)> {
        self.inner.enqueue(request).await
    }

    async fn requeue_story(&self, story_id: StoryId) -> BabelResult<JobId> {
        self.inner.requeue_story(story_id).await
    }

    async fn count_by_status(&self) -> BabelResult<JobCounts> {
        self.inner.count_by_status().await
    }

    async fn ping(&self) -> BabelResult<()> {
        self.inner.ping().await
    }
}

#[async_trait]
impl StoryStore for TestStore {
    async fn update_status(
        &self,
        id: StoryId,
        status: StoryStatus,
        progress: Option<StoryProgress>,
        error: Option<&str>,
    ) -> BabelResult<()> {
        self.statuses.lock().push(status);
        self.inner.update_status(id, status, progress, error).await
    }

    async fn save_metadata(
        &self,
        id: StoryId,
        title: &str,
        metadata: &StoryMetadata,
        total_pages: u32,
    ) -> BabelResult<()> {
        if self.fail_save_metadata.load(Ordering::SeqCst) {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(
                "disk full".to_string(),
            ))
            .into());
        }
        self.inner
            .save_metadata(id, title, metadata, total_pages)
            .await
    }

    async fn save_page(&self, id: StoryId, page: &StoryPage) -> BabelResult<()> {
        self.page_save_times.lock().push(Instant::now());
        if let Some(story) = self.inner.story(id) {
            self.before_page_save.lock().push(story);
        }
        self.inner.save_page(id, page).await
    }

    async fn mark_completed(&self, id: StoryId) -> BabelResult<()> {
        self.statuses.lock().push(StoryStatus::Completed);
        self.inner.mark_completed(id).await
    }

    async fn get_story(&self, id: StoryId) -> BabelResult<Option<Story>> {
        self.inner.get_story(id).await
    }
}

/// Blob store that rejects every upload.
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(
        &self,
        key: &str,
        _data: &[u8],
        _metadata: &BlobMetadata,
    ) -> BabelResult<BlobReference> {
        Err(StorageError::new(StorageErrorKind::ObjectWrite(format!("{key}: bucket unavailable"))).into())
    }

    async fn get(&self, key: &str) -> BabelResult<Vec<u8>> {
        Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())).into())
    }

    async fn exists(&self, _key: &str) -> BabelResult<bool> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> BabelResult<()> {
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("unavailable://{key}")
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Loop timing for tests that drive `run`: short idle polls, a visible backoff.
pub fn looping(image_mode: ImageMode) -> CoordinatorSettings {
    CoordinatorSettings {
        idle_interval: Duration::from_millis(1),
        error_backoff: Duration::from_millis(50),
        ..CoordinatorSettings::immediate(image_mode)
    }
}

/// A coordinator wired to the doubles.
pub fn coordinator(
    store: &Arc<TestStore>,
    writer: Arc<dyn StoryWriter>,
    illustrator: Arc<dyn Illustrator>,
    narrator: Arc<dyn Narrator>,
    settings: CoordinatorSettings,
) -> JobCoordinator {
    let queue: Arc<dyn JobQueue> = store.clone();
    let stories: Arc<dyn StoryStore> = store.clone();
    JobCoordinator::builder()
        .queue(queue)
        .stories(stories.clone())
        .persistence(ProgressivePersistence::new(stories))
        .generators(Generators::new(writer, illustrator, narrator))
        .gate(SafetyGate::standard().expect("standard policy compiles"))
        .settings(settings)
        .build()
        .expect("complete coordinator")
}
