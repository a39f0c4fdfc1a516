//! Behavior shared by every queue and store implementation.

#![allow(dead_code)]

use babel_core::{
    JobRequest, JobStatus, StoryMetadata, StoryPage, StoryProgress, StoryStatus,
};
use babel_error::{BabelErrorKind, PipelineErrorKind};
use babel_interface::{JobQueue, StoryStore};

pub fn request(prompt: &str) -> JobRequest {
    JobRequest::builder()
        .prompt(prompt)
        .build()
        .expect("valid request")
}

pub fn metadata(pages: u32) -> StoryMetadata {
    StoryMetadata {
        age_group: "3-4 years".to_string(),
        tone: "playful".to_string(),
        language: "English".to_string(),
        page_count: pages,
    }
}

pub fn page(number: u32, text: &str) -> StoryPage {
    StoryPage {
        page_number: number,
        text: text.to_string(),
        image_prompt: format!("illustration {number}"),
        interactive_element: None,
        narrator_note: None,
        image: None,
        audio: None,
    }
}

fn pipeline_kind(err: &babel_error::BabelError) -> Option<&PipelineErrorKind> {
    match err.kind() {
        BabelErrorKind::Pipeline(e) => Some(&e.kind),
        _ => None,
    }
}

pub async fn claims_oldest_first<S: JobQueue>(store: &S) -> anyhow::Result<()> {
    let (first, _) = store.enqueue(request("first")).await?;
    let (second, _) = store.enqueue(request("second")).await?;

    let claimed = store.claim_next().await?.expect("a pending job");
    assert_eq!(*claimed.id(), first);
    assert_eq!(*claimed.status(), JobStatus::Processing);
    assert_eq!(claimed.data().prompt, "first");

    let claimed = store.claim_next().await?.expect("a pending job");
    assert_eq!(*claimed.id(), second);

    assert!(store.claim_next().await?.is_none());
    Ok(())
}

pub async fn failure_records_error_and_attempt<S: JobQueue>(store: &S) -> anyhow::Result<()> {
    let (job_id, _) = store.enqueue(request("a curious fox")).await?;
    store.claim_next().await?.expect("a pending job");
    store.fail_job(job_id, "text model unavailable").await?;

    let counts = store.count_by_status().await?;
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.pending, 0);
    assert!(store.claim_next().await?.is_none());
    Ok(())
}

pub async fn progressive_writes<S: JobQueue + StoryStore>(store: &S) -> anyhow::Result<()> {
    let (_, story_id) = store.enqueue(request("a curious fox")).await?;

    store
        .update_status(
            story_id,
            StoryStatus::GeneratingText,
            Some(StoryProgress::at_page(0, 0)),
            None,
        )
        .await?;
    store
        .save_metadata(story_id, "The Curious Fox", &metadata(3), 3)
        .await?;

    let story = store.get_story(story_id).await?.expect("story exists");
    assert_eq!(*story.status(), StoryStatus::GeneratingAssets);
    assert!(*story.text_generated());
    assert_eq!(story.story().title.as_deref(), Some("The Curious Fox"));
    assert_eq!(story.story().total_pages, Some(3));
    assert!(story.story().pages.is_empty());

    store.save_page(story_id, &page(2, "second")).await?;
    store.save_page(story_id, &page(1, "first")).await?;
    store.save_page(story_id, &page(1, "first, again")).await?;

    let story = store.get_story(story_id).await?.expect("story exists");
    let numbers: Vec<u32> = story.story().pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(story.page(1).map(|p| p.text.as_str()), Some("first, again"));
    let progress = story.progress().clone().expect("progress recorded");
    assert_eq!(progress.completed_pages, vec![1, 2]);
    assert_eq!(progress.current_page, Some(1));
    assert_eq!(progress.total_pages, Some(3));
    Ok(())
}

pub async fn pages_outside_range_are_rejected<S: JobQueue + StoryStore>(
    store: &S,
) -> anyhow::Result<()> {
    let (_, story_id) = store.enqueue(request("a curious fox")).await?;
    store.save_metadata(story_id, "Fox", &metadata(2), 2).await?;

    let err = store
        .save_page(story_id, &page(3, "too far"))
        .await
        .expect_err("page 3 of 2");
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::PageOutOfRange { page: 3, total: 2 })
    ));
    assert!(store.save_page(story_id, &page(0, "zero")).await.is_err());
    Ok(())
}

pub async fn pages_need_stored_metadata<S: JobQueue + StoryStore>(
    store: &S,
) -> anyhow::Result<()> {
    let (job_id, story_id) = store.enqueue(request("a curious fox")).await?;

    let err = store
        .save_page(story_id, &page(1, "too early"))
        .await
        .expect_err("no metadata yet");
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::MetadataMissing(_))
    ));

    store.save_metadata(story_id, "Fox", &metadata(2), 2).await?;
    store.save_page(story_id, &page(1, "one")).await?;
    store.save_page(story_id, &page(2, "two")).await?;
    let err = store
        .save_page(story_id, &page(3, "three"))
        .await
        .expect_err("page 3 of 2");
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::PageOutOfRange { page: 3, total: 2 })
    ));
    let story = store.get_story(story_id).await?.expect("story exists");
    assert_eq!(story.story().pages.len(), 2);

    store.claim_next().await?.expect("a pending job");
    store.requeue_story(story_id).await?;
    let err = store
        .save_page(story_id, &page(1, "late write"))
        .await
        .expect_err("requeued story has no metadata");
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::MetadataMissing(_))
    ));
    let story = store.get_story(story_id).await?.expect("story exists");
    assert!(story.story().pages.is_empty());
    assert_eq!(story.story().total_pages, None);
    let claimed = store.claim_next().await?.expect("requeued job");
    assert_eq!(*claimed.id(), job_id);
    Ok(())
}

pub async fn completed_stories_are_frozen<S: JobQueue + StoryStore>(
    store: &S,
) -> anyhow::Result<()> {
    let (_, story_id) = store.enqueue(request("a curious fox")).await?;
    store.save_metadata(story_id, "Fox", &metadata(1), 1).await?;
    store.save_page(story_id, &page(1, "the end")).await?;
    store.mark_completed(story_id).await?;
    store.mark_completed(story_id).await?;

    let story = store.get_story(story_id).await?.expect("story exists");
    assert_eq!(*story.status(), StoryStatus::Completed);
    assert!(story.completed_at().is_some());

    let err = store
        .update_status(story_id, StoryStatus::Failed, None, Some("late failure"))
        .await
        .expect_err("completed story is frozen");
    assert!(matches!(
        pipeline_kind(&err),
        Some(PipelineErrorKind::StoryCompleted(_))
    ));
    assert!(store.save_page(story_id, &page(1, "rewrite")).await.is_err());
    assert!(store.requeue_story(story_id).await.is_err());

    let story = store.get_story(story_id).await?.expect("story exists");
    assert_eq!(*story.status(), StoryStatus::Completed);
    assert_eq!(story.page(1).map(|p| p.text.as_str()), Some("the end"));
    Ok(())
}

pub async fn requeue_resets_story_and_job<S: JobQueue + StoryStore>(
    store: &S,
) -> anyhow::Result<()> {
    let (job_id, story_id) = store.enqueue(request("a curious fox")).await?;
    store.claim_next().await?.expect("a pending job");
    store.save_metadata(story_id, "Fox", &metadata(2), 2).await?;
    store.save_page(story_id, &page(1, "one")).await?;
    store
        .update_status(story_id, StoryStatus::Failed, None, Some("image model down"))
        .await?;
    store.fail_job(job_id, "image model down").await?;

    let requeued = store.requeue_story(story_id).await?;
    assert_eq!(requeued, job_id);

    let story = store.get_story(story_id).await?.expect("story exists");
    assert_eq!(*story.status(), StoryStatus::Pending);
    assert!(story.story().pages.is_empty());
    assert!(!*story.text_generated());
    assert!(story.error().is_none());

    let claimed = store.claim_next().await?.expect("requeued job");
    assert_eq!(*claimed.id(), job_id);
    assert_eq!(*claimed.attempts(), 1);
    Ok(())
}

pub async fn missing_records_are_reported<S: JobQueue + StoryStore>(
    store: &S,
) -> anyhow::Result<()> {
    let unknown = babel_core::StoryId::new();
    assert!(store.get_story(unknown).await?.is_none());
    assert!(store.mark_completed(unknown).await.is_err());
    assert!(store.requeue_story(unknown).await.is_err());
    assert!(store.complete_job(babel_core::JobId::new()).await.is_err());
    Ok(())
}
