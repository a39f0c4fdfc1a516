//! The job coordinator: claims queued jobs and drives each through the
//! text, image and narration stages.
//!
//! Story status moves through
//! `processing → generating_text → generating_images → generating_audio → completed`
//! (`generating_assets` replaces the image and audio phases in per-page mode), with
//! `failed` reachable from any state. Image and narration failures are isolated to
//! their page; anything else fails the job.

use crate::{ImageMode, ProgressivePersistence, WorkerConfig};
use babel_core::{
    AudioClip, GeneratedPage, GeneratedStory, ImageAsset, Job, JobId, JobRequest, StoryId,
    StoryProgress, StoryStatus,
};
use babel_error::{BabelError, BabelResult, ConfigError};
use babel_interface::{ImageRequest, JobQueue, NarrationRequest, StoryContext, StoryStore};
use babel_models::{Generators, placeholder_image};
use babel_security::SafetyGate;
use babel_storage::FileSystemBlobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

/// Used when a generated image prompt trips the safety gate.
const NEUTRAL_SCENE: &str = "A gentle, friendly scene from a children's picture book";

/// Loop timing and illustration strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorSettings {
    /// Sleep after a poll that found no job
    pub idle_interval: Duration,
    /// Sleep after a failed claim
    pub error_backoff: Duration,
    /// Throttle between pages
    pub page_delay: Duration,
    /// Batched or per-page illustration
    pub image_mode: ImageMode,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
            page_delay: Duration::from_millis(500),
            image_mode: ImageMode::Batch,
        }
    }
}

impl CoordinatorSettings {
    /// No sleeping anywhere.
    pub fn immediate(image_mode: ImageMode) -> Self {
        Self {
            idle_interval: Duration::ZERO,
            error_backoff: Duration::ZERO,
            page_delay: Duration::ZERO,
            image_mode,
        }
    }
}

/// How a claimed job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Story and job completed
    Completed,
    /// Story and job failed with this cause
    Failed(String),
}

/// Claims and processes jobs one at a time.
#[derive(derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct JobCoordinator {
    /// Source of work
    queue: Arc<dyn JobQueue>,
    /// Story status writes
    stories: Arc<dyn StoryStore>,
    /// Metadata, page and completion writes
    persistence: ProgressivePersistence,
    /// Text, image and narration backends
    generators: Generators,
    /// Prompt filter
    gate: SafetyGate,
    /// Loop timing
    #[builder(default)]
    settings: CoordinatorSettings,
}

impl std::fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCoordinator")
            .field("persistence", &self.persistence)
            .field("generators", &self.generators)
            .field("settings", &self.settings)
            .finish()
    }
}

impl JobCoordinator {
    /// Creates a new builder.
    pub fn builder() -> JobCoordinatorBuilder {
        JobCoordinatorBuilder::default()
    }

    /// Wire a coordinator from configuration: generator backends, the standard
    /// safety gate and, when enabled, filesystem blob storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend or the blob store cannot be constructed.
    pub fn from_config(
        config: &WorkerConfig,
        queue: Arc<dyn JobQueue>,
        stories: Arc<dyn StoryStore>,
    ) -> BabelResult<Self> {
        let generators = Generators::from_settings(&config.generator_settings())?;

        let mut persistence = ProgressivePersistence::new(Arc::clone(&stories));
        if *config.enable_blob_storage() {
            let (Some(root), Some(url)) = (config.blob_root(), config.blob_public_url()) else {
                return Err(ConfigError::new(
                    "BLOB_ROOT and BLOB_PUBLIC_URL are required when blob storage is enabled",
                )
                .into());
            };
            persistence =
                persistence.with_blob_store(Arc::new(FileSystemBlobStore::new(root, url)?));
        }

        Self::builder()
            .queue(queue)
            .stories(stories)
            .persistence(persistence)
            .generators(generators)
            .gate(SafetyGate::standard()?)
            .settings(config.coordinator_settings())
            .build()
            .map_err(|e| ConfigError::new(format!("Incomplete coordinator: {e}")).into())
    }

    /// Poll until `shutdown` turns true.
    ///
    /// The signal is checked between jobs and interrupts idle and backoff sleeps;
    /// an in-flight job always runs to its end.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            image_mode = %self.settings.image_mode,
            idle_ms = self.settings.idle_interval.as_millis() as u64,
            "Job coordinator started"
        );

        while !*shutdown.borrow() {
            let pause = match self.poll_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => self.settings.idle_interval,
                Err(e) => {
                    error!(error = %e, "Failed to claim job, backing off");
                    self.settings.error_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Job coordinator stopped");
    }

    /// Claim and process at most one job.
    ///
    /// Returns `Ok(None)` when no job is pending. Errors are claim failures only;
    /// job failures are recorded on the job and reported as [`JobOutcome::Failed`].
    pub async fn poll_once(&self) -> BabelResult<Option<(JobId, JobOutcome)>> {
        let Some(job) = self.queue.claim_next().await? else {
            return Ok(None);
        };
        let job_id = *job.id();
        let outcome = self.process_job(job).await;
        Ok(Some((job_id, outcome)))
    }

    /// Run the pipeline for a claimed job and record the result on job and story.
    pub async fn process_job(&self, job: Job) -> JobOutcome {
        let span = info_span!(
            "process_job",
            job_id = %job.id(),
            story_id = %job.story_id(),
            attempt = job.attempts() + 1
        );
        async {
            info!(prompt = %job.data().prompt, "Processing job");
            match self.run_pipeline(*job.story_id(), job.data()).await {
                Ok(()) => {
                    if let Err(e) = self.queue.complete_job(*job.id()).await {
                        error!(error = %e, "Story completed but the job could not be marked completed");
                    }
                    info!("Job completed");
                    JobOutcome::Completed
                }
                Err(e) => self.fail(&job, &e).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn fail(&self, job: &Job, err: &BabelError) -> JobOutcome {
        let summary = err.summary();
        if err.is_unsafe_prompt() {
            warn!(error = %summary, "Prompt rejected");
        } else {
            error!(error = %err, "Job failed");
        }

        if let Err(e) = self
            .stories
            .update_status(*job.story_id(), StoryStatus::Failed, None, Some(&summary))
            .await
        {
            error!(error = %e, "Could not mark story failed");
        }
        if let Err(e) = self.queue.fail_job(*job.id(), &summary).await {
            error!(error = %e, "Could not mark job failed, it stays processing");
        }
        JobOutcome::Failed(summary)
    }

    async fn run_pipeline(&self, story_id: StoryId, request: &JobRequest) -> BabelResult<()> {
        self.stories
            .update_status(story_id, StoryStatus::Processing, None, None)
            .await?;

        self.gate.check_prompt(&request.prompt)?;

        self.stories
            .update_status(story_id, StoryStatus::GeneratingText, None, None)
            .await?;
        let story = self.write_story(request).await?;
        let total_pages = story.page_count();

        self.persistence
            .save_story_metadata(story_id, &story)
            .await?;

        let context = StoryContext::from_story(&story, request.age_group());
        match self.settings.image_mode {
            ImageMode::Batch => {
                self.stories
                    .update_status(
                        story_id,
                        StoryStatus::GeneratingImages,
                        Some(StoryProgress::of_total(total_pages)),
                        None,
                    )
                    .await?;
                let images = self.illustrate_all(request, &story, &context).await;

                self.stories
                    .update_status(
                        story_id,
                        StoryStatus::GeneratingAudio,
                        Some(StoryProgress::of_total(total_pages)),
                        None,
                    )
                    .await?;
                for (index, (page, image)) in story.pages.iter().zip(images).enumerate() {
                    let audio = self.narrate(request, page).await;
                    self.persistence
                        .save_page(story_id, page, Some(image), audio)
                        .await?;
                    self.throttle(index, story.pages.len()).await;
                }
            }
            ImageMode::PerPage => {
                self.stories
                    .update_status(
                        story_id,
                        StoryStatus::GeneratingAssets,
                        Some(StoryProgress::of_total(total_pages)),
                        None,
                    )
                    .await?;
                for (index, page) in story.pages.iter().enumerate() {
                    let image = self.illustrate(request, page, &context).await;
                    let audio = self.narrate(request, page).await;
                    self.persistence
                        .save_page(story_id, page, Some(image), audio)
                        .await?;
                    self.throttle(index, story.pages.len()).await;
                }
            }
        }

        self.persistence.mark_story_completed(story_id).await
    }

    #[instrument(skip_all)]
    async fn write_story(&self, request: &JobRequest) -> BabelResult<GeneratedStory> {
        let mut story = self.generators.writer.write(request).await?;
        for page in &mut story.pages {
            page.text = self.gate.sanitize_text(&page.text);
        }
        info!(
            title = %story.title,
            pages = story.page_count(),
            backend = self.generators.writer.backend_name(),
            "Story text generated"
        );
        Ok(story)
    }

    fn image_request(&self, request: &JobRequest, page: &GeneratedPage) -> ImageRequest {
        let prompt = if self.gate.is_image_prompt_safe(&page.image_prompt) {
            page.image_prompt.as_str()
        } else {
            warn!(page = page.page_number, "Image prompt failed the safety check, using a neutral scene");
            NEUTRAL_SCENE
        };
        ImageRequest {
            page_number: page.page_number,
            text: page.text.clone(),
            prompt: self.gate.make_image_prompt_safe(prompt, request.age_group()),
        }
    }

    /// One image per page, in page order. A failed batch becomes all placeholders.
    async fn illustrate_all(
        &self,
        request: &JobRequest,
        story: &GeneratedStory,
        context: &StoryContext,
    ) -> Vec<ImageAsset> {
        let requests: Vec<ImageRequest> = story
            .pages
            .iter()
            .map(|page| self.image_request(request, page))
            .collect();

        let mut images = match self
            .generators
            .illustrator
            .illustrate_batch(&requests, context)
            .await
        {
            Ok(images) => images,
            Err(e) => {
                warn!(
                    error = %e,
                    pages = requests.len(),
                    "Image batch failed, using placeholders"
                );
                Vec::new()
            }
        };

        if images.len() != requests.len() {
            debug!(
                expected = requests.len(),
                received = images.len(),
                "Image count mismatch, padding with placeholders"
            );
        }
        images.truncate(requests.len());
        images.resize_with(requests.len(), placeholder_image);
        images
    }

    async fn illustrate(
        &self,
        request: &JobRequest,
        page: &GeneratedPage,
        context: &StoryContext,
    ) -> ImageAsset {
        let image_request = self.image_request(request, page);
        match self
            .generators
            .illustrator
            .illustrate(&image_request, context)
            .await
        {
            Ok(image) => image,
            Err(e) => {
                warn!(page = page.page_number, error = %e, "Image generation failed, using placeholder");
                placeholder_image()
            }
        }
    }

    async fn narrate(&self, request: &JobRequest, page: &GeneratedPage) -> Option<AudioClip> {
        let narration = NarrationRequest::for_page(
            request,
            page.page_number,
            page.text.as_str(),
            page.interactive_element.clone(),
        );
        match self.generators.narrator.narrate(&narration).await {
            Ok(clip) => Some(clip),
            Err(e) => {
                error!(page = page.page_number, error = %e, "Narration failed, saving page without audio");
                None
            }
        }
    }

    async fn throttle(&self, index: usize, page_count: usize) {
        if index + 1 < page_count && !self.settings.page_delay.is_zero() {
            tokio::time::sleep(self.settings.page_delay).await;
        }
    }
}
