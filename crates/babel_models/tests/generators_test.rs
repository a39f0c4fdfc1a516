//! Tests for generator backends that run without network access.

mod test_utils;

use babel_core::{AgeGroup, GeneratedStory, JobRequest};
use babel_error::{BabelErrorKind, GenerationError, GenerationErrorKind};
use babel_interface::{
    ImageRequest, Illustrator, NarrationRequest, Narrator, StoryContext, StoryWriter,
};
use babel_models::wav::Pcm;
use babel_models::{
    BatchingIllustrator, FallbackNarrator, GeneratorSettings, Generators, MixingNarrator,
    PlaceholderIllustrator, RetryPolicy, TemplateStoryWriter, ToneNarrator, build_story_prompt,
    estimate_duration, png, with_retry,
};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use test_utils::{MockIllustrator, MockImageBehavior, MockNarrator, Mp3Narrator};

fn request(age: &str) -> JobRequest {
    JobRequest::builder()
        .prompt("a curious fox")
        .child_age(age)
        .tone("wholesome")
        .build()
        .expect("valid request")
}

fn image_requests(count: u32) -> Vec<ImageRequest> {
    (1..=count)
        .map(|n| ImageRequest {
            page_number: n,
            text: format!("page {n}"),
            prompt: format!("scene {n}"),
        })
        .collect()
}

async fn sample_context() -> anyhow::Result<(GeneratedStory, StoryContext)> {
    let story = TemplateStoryWriter::new().write(&request("3-4 years")).await?;
    let context = StoryContext::from_story(&story, AgeGroup::ThreeToFourYears);
    Ok((story, context))
}

fn narration(interactive: Option<&str>) -> NarrationRequest {
    NarrationRequest::for_page(
        &request("3-4 years"),
        1,
        "The fox looked at the moon and smiled.",
        interactive.map(str::to_string),
    )
}

#[tokio::test]
async fn test_template_writer_matches_age_band() -> anyhow::Result<()> {
    let writer = TemplateStoryWriter::new();
    for group in AgeGroup::ALL {
        let story = writer.write(&request(group.label())).await?;
        assert_eq!(story.page_count(), group.profile().pages);
        assert!(story.is_sequential());
        assert!(story.pages.iter().all(|p| !p.text.is_empty()));
        assert_eq!(story.metadata.age_group, group.label());
    }
    Ok(())
}

#[test]
fn test_story_prompt_pins_page_count() {
    let mut req = request("4-5 years");
    req.child_name = Some("Maya".to_string());
    let prompt = build_story_prompt(&req);
    assert!(prompt.contains("Exactly 12 pages"));
    assert!(prompt.contains("About 80 words per page"));
    assert!(prompt.contains("named Maya"));
    assert!(prompt.contains("\"a curious fox\""));
}

#[tokio::test]
async fn test_placeholder_is_sky_blue_png() -> anyhow::Result<()> {
    let (_, context) = sample_context().await?;
    let images = PlaceholderIllustrator::new()
        .illustrate_batch(&image_requests(3), &context)
        .await?;
    assert_eq!(images.len(), 3);
    for image in images {
        assert!(image.placeholder);
        assert_eq!(image.format, "png");
        assert_eq!(png::dimensions(&image.bytes), Some((1024, 768)));
    }
    Ok(())
}

#[tokio::test]
async fn test_batching_chunks_by_backend_cap() -> anyhow::Result<()> {
    let (_, context) = sample_context().await?;
    let mock = Arc::new(MockIllustrator::new(MockImageBehavior::Success, 4));
    let batching = BatchingIllustrator::new(mock.clone());

    let images = batching.illustrate_batch(&image_requests(10), &context).await?;

    assert_eq!(mock.batch_sizes(), vec![4, 4, 2]);
    assert_eq!(images.len(), 10);
    for (index, image) in images.iter().enumerate() {
        assert!(!image.placeholder);
        assert_eq!(image.bytes[0], index as u8 + 1, "images stay in page order");
    }
    Ok(())
}

#[tokio::test]
async fn test_batching_isolates_failed_chunk() -> anyhow::Result<()> {
    let (_, context) = sample_context().await?;
    let mock = Arc::new(MockIllustrator::new(MockImageBehavior::FailFirst, 4));
    let images = BatchingIllustrator::new(mock)
        .illustrate_batch(&image_requests(6), &context)
        .await?;

    assert_eq!(images.len(), 6);
    assert!(images[..4].iter().all(|image| image.placeholder));
    assert!(images[4..].iter().all(|image| !image.placeholder));
    Ok(())
}

#[tokio::test]
async fn test_batching_pads_and_truncates() -> anyhow::Result<()> {
    let (_, context) = sample_context().await?;

    let short = Arc::new(MockIllustrator::new(MockImageBehavior::Fixed(1), 4));
    let images = BatchingIllustrator::new(short)
        .illustrate_batch(&image_requests(3), &context)
        .await?;
    assert_eq!(images.len(), 3);
    assert!(!images[0].placeholder);
    assert!(images[1].placeholder && images[2].placeholder);

    let long = Arc::new(MockIllustrator::new(MockImageBehavior::Fixed(6), 4));
    let images = BatchingIllustrator::new(long)
        .illustrate_batch(&image_requests(2), &context)
        .await?;
    assert_eq!(images.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_fallback_narrator_uses_next_tier() -> anyhow::Result<()> {
    let primary = Arc::new(MockNarrator::failing("premium"));
    let baseline = Arc::new(MockNarrator::succeeding("baseline"));
    let chain = FallbackNarrator::new(vec![primary.clone(), baseline.clone()]);

    let clip = chain.narrate(&narration(None)).await?;
    assert_eq!(clip.bytes, b"baseline");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(baseline.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_fallback_narrator_reports_last_error() -> anyhow::Result<()> {
    let chain = FallbackNarrator::new(vec![
        Arc::new(MockNarrator::failing("premium")),
        Arc::new(MockNarrator::failing("baseline")),
    ]);
    let err = chain.narrate(&narration(None)).await.expect_err("all tiers fail");
    assert!(err.summary().contains("baseline failed"));

    let empty = FallbackNarrator::new(Vec::new());
    assert!(empty.narrate(&narration(None)).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_tone_narrator_produces_wav() -> anyhow::Result<()> {
    let clip = ToneNarrator::new().narrate(&narration(None)).await?;
    assert_eq!(clip.format, "wav");
    assert!(clip.duration_secs >= 1.0);
    let pcm = Pcm::from_wav(&clip.bytes)?;
    assert!((pcm.duration_secs() - clip.duration_secs).abs() < 0.01);
    Ok(())
}

#[tokio::test]
async fn test_mixing_appends_cue_for_interactive_pages() -> anyhow::Result<()> {
    let mixer = MixingNarrator::new(Arc::new(ToneNarrator::new()));
    let plain = mixer.narrate(&narration(None)).await?;
    let cued = mixer.narrate(&narration(Some("Tap the moon!"))).await?;

    assert_eq!(plain.format, "wav");
    assert!((cued.duration_secs - plain.duration_secs - 0.2).abs() < 0.01);
    Ok(())
}

#[tokio::test]
async fn test_mixing_decodes_mp3_narration() -> anyhow::Result<()> {
    let mixer = MixingNarrator::new(Arc::new(Mp3Narrator { frames: 20 }));
    let plain = mixer.narrate(&narration(None)).await?;
    let cued = mixer.narrate(&narration(Some("Clap!"))).await?;

    assert_eq!(plain.format, "wav");
    let pcm = Pcm::from_wav(&plain.bytes)?;
    assert_eq!(pcm.sample_rate, 48_000);
    assert!(pcm.samples.iter().any(|&s| s != 0), "bed mixed under silent speech");
    assert!((pcm.duration_secs() - plain.duration_secs).abs() < 0.01);
    assert!((cued.duration_secs - plain.duration_secs - 0.2).abs() < 0.01);
    Ok(())
}

#[tokio::test]
async fn test_mixing_passes_through_undecodable_mp3() -> anyhow::Result<()> {
    let mixer = MixingNarrator::new(Arc::new(MockNarrator::succeeding("mp3-backend")));
    let clip = mixer.narrate(&narration(Some("Clap!"))).await?;
    assert_eq!(clip.format, "mp3");
    assert_eq!(clip.bytes, b"mp3-backend");
    Ok(())
}

#[tokio::test]
async fn test_baseline_narration_falls_back_to_a_mixed_tone() -> anyhow::Result<()> {
    let settings = GeneratorSettings::builder()
        .tts_fallback_url("http://127.0.0.1:9/translate_tts")
        .retry(RetryPolicy::none())
        .build()?;
    let baseline = Generators::baseline_narrator(&settings)?;
    assert_eq!(baseline.backend_name(), "translate-tts");

    let mixed = baseline.narrate(&narration(Some("Tap the moon!"))).await?;
    assert_eq!(mixed.format, "wav");
    assert!(Pcm::from_wav(&mixed.bytes)?.duration_secs() >= 1.0);

    let quiet = GeneratorSettings::builder()
        .tts_fallback_url("http://127.0.0.1:9/translate_tts")
        .retry(RetryPolicy::none())
        .enable_background_music(false)
        .build()?;
    let unmixed = Generators::baseline_narrator(&quiet)?
        .narrate(&narration(Some("Tap the moon!")))
        .await?;
    assert_eq!(unmixed.format, "wav");
    assert!((mixed.duration_secs - unmixed.duration_secs - 0.2).abs() < 0.01);
    Ok(())
}

#[test]
fn test_estimate_duration() {
    assert_eq!(estimate_duration(""), 0.0);
    assert_eq!(estimate_duration(&"x".repeat(75)), 6.0);
    assert_eq!(estimate_duration(&"x".repeat(13)), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_from_transient_errors() -> anyhow::Result<()> {
    let attempts = AtomicUsize::new(0);
    let policy = RetryPolicy {
        max_retries: 3,
        initial_backoff_ms: Some(10),
    };

    let value = with_retry(&policy, "test", || {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(GenerationError::new(GenerationErrorKind::Http {
                    status_code: 503,
                    message: "busy".to_string(),
                }))
            } else {
                Ok(n)
            }
        }
    })
    .await?;

    assert_eq!(value, 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_retry_stops_on_permanent_errors() {
    let attempts = AtomicUsize::new(0);
    let result: Result<(), _> = with_retry(&RetryPolicy::default(), "test", || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async {
            Err(GenerationError::new(GenerationErrorKind::Http {
                status_code: 400,
                message: "bad request".to_string(),
            }))
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_factory_mocked_needs_no_key() -> anyhow::Result<()> {
    let settings = GeneratorSettings::builder()
        .use_mock_stories(true)
        .use_mock_images(true)
        .use_mock_audio(true)
        .build()?;
    let generators = Generators::from_settings(&settings)?;
    assert_eq!(generators.writer.backend_name(), "template");
    assert_eq!(generators.illustrator.backend_name(), "placeholder");
    assert_eq!(generators.narrator.backend_name(), "tone");
    Ok(())
}

#[test]
fn test_factory_requires_key_for_real_backends() -> anyhow::Result<()> {
    let settings = GeneratorSettings::builder()
        .use_mock_stories(true)
        .use_mock_images(false)
        .use_mock_audio(true)
        .build()?;
    let err = Generators::from_settings(&settings).expect_err("missing key");
    assert!(matches!(
        err.kind(),
        BabelErrorKind::Generation(e) if matches!(e.kind, GenerationErrorKind::MissingCredentials(_))
    ));
    Ok(())
}

#[test]
fn test_factory_selects_real_backends_with_key() -> anyhow::Result<()> {
    let settings = GeneratorSettings::builder()
        .gemini_api_key(Some("test-key-123456".to_string()))
        .build()?;
    let generators = Generators::from_settings(&settings)?;
    assert_eq!(generators.writer.backend_name(), "gemini");
    assert_eq!(generators.illustrator.backend_name(), "batching");
    assert_eq!(generators.narrator.backend_name(), "gemini-tts");
    Ok(())
}

#[test]
fn test_age_label_round_trip() {
    for group in AgeGroup::ALL {
        assert_eq!(AgeGroup::from_str(group.label()).ok(), Some(group));
    }
}
