//! Progressive persistence: story state is written as soon as each piece exists.

use babel_core::{
    AssetLocation, AudioClip, GeneratedPage, GeneratedStory, ImageAsset, PageAudio, PageImage,
    StoryId,
};
use babel_error::BabelResult;
use babel_interface::StoryStore;
use babel_storage::{AssetKind, BlobMetadata, BlobStore, asset_key};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Writes story metadata, pages and completion to the story store.
///
/// With a blob store attached, page images and narration are uploaded and the
/// page carries only a reference (URL, key, content type, size). Without one,
/// or when an upload fails, the bytes are embedded as base64.
#[derive(Clone)]
pub struct ProgressivePersistence {
    store: Arc<dyn StoryStore>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl std::fmt::Debug for ProgressivePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressivePersistence")
            .field("blobs", &self.blobs.as_ref().map(|b| b.backend_name()))
            .finish()
    }
}

impl ProgressivePersistence {
    /// Persist into `store`, embedding assets inline.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store, blobs: None }
    }

    /// Offload assets to `blobs`.
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// True if assets are offloaded to blob storage.
    pub fn offloads_assets(&self) -> bool {
        self.blobs.is_some()
    }

    /// Record title, metadata and page count with an empty page list.
    ///
    /// Readers see the story move to `generating_assets` with `textGenerated` set.
    #[instrument(skip(self, story), fields(total_pages = story.page_count()))]
    pub async fn save_story_metadata(
        &self,
        story_id: StoryId,
        story: &GeneratedStory,
    ) -> BabelResult<()> {
        self.store
            .save_metadata(story_id, &story.title, &story.metadata, story.page_count())
            .await?;
        info!(title = %story.title, "Saved story metadata");
        Ok(())
    }

    /// Save one page with whichever assets were produced.
    ///
    /// A page saved twice replaces the earlier copy. The store rejects pages
    /// outside the page count recorded with the metadata.
    #[instrument(skip(self, page, image, audio), fields(page = page.page_number))]
    pub async fn save_page(
        &self,
        story_id: StoryId,
        page: &GeneratedPage,
        image: Option<ImageAsset>,
        audio: Option<AudioClip>,
    ) -> BabelResult<()> {
        let mut stored = page.to_story_page();

        if let Some(image) = image {
            let location = self
                .locate(story_id, page.page_number, AssetKind::Image, &image.bytes, &image.format)
                .await;
            stored.image = Some(PageImage {
                location,
                format: image.format,
                placeholder: image.placeholder,
            });
        }

        if let Some(audio) = audio {
            let location = self
                .locate(story_id, page.page_number, AssetKind::Audio, &audio.bytes, &audio.format)
                .await;
            stored.audio = Some(PageAudio {
                location,
                format: audio.format,
                duration: audio.duration_secs,
            });
        }

        self.store.save_page(story_id, &stored).await?;
        debug!(
            has_image = stored.image.is_some(),
            has_audio = stored.audio.is_some(),
            "Saved page"
        );
        Ok(())
    }

    /// Set the story `completed`.
    #[instrument(skip(self))]
    pub async fn mark_story_completed(&self, story_id: StoryId) -> BabelResult<()> {
        self.store.mark_completed(story_id).await?;
        info!("Story completed");
        Ok(())
    }

    async fn locate(
        &self,
        story_id: StoryId,
        page_number: u32,
        kind: AssetKind,
        bytes: &[u8],
        format: &str,
    ) -> AssetLocation {
        if let Some(blobs) = &self.blobs {
            let key = asset_key(
                story_id,
                page_number,
                kind,
                Utc::now().timestamp_millis(),
                format,
            );
            let metadata = BlobMetadata::new(kind.content_type(format))
                .with_tag("storyId", story_id)
                .with_tag("pageNumber", page_number)
                .with_tag("assetType", kind);
            match blobs.put(&key, bytes, &metadata).await {
                Ok(reference) => {
                    return AssetLocation::Blob {
                        url: reference.url,
                        key: reference.key,
                        content_type: reference.content_type,
                        size_bytes: reference.size_bytes,
                    };
                }
                Err(e) => {
                    warn!(%key, error = %e, "Blob upload failed, embedding asset inline");
                }
            }
        }
        AssetLocation::Inline {
            data: BASE64_STANDARD.encode(bytes),
        }
    }
}
