//! Chunked batch illustration with placeholder substitution.

use crate::placeholder_image;
use async_trait::async_trait;
use babel_core::ImageAsset;
use babel_error::BabelResult;
use babel_interface::{ImageRequest, Illustrator, StoryContext};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Splits page lists into chunks no larger than the inner backend's cap and
/// concatenates results in page order.
///
/// A failed chunk becomes placeholders for every page in it; a short chunk is padded
/// with placeholders and a long one truncated, so the output always has exactly one
/// image per request.
#[derive(Clone)]
pub struct BatchingIllustrator {
    inner: Arc<dyn Illustrator>,
}

impl BatchingIllustrator {
    /// Wrap a backend.
    pub fn new(inner: Arc<dyn Illustrator>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for BatchingIllustrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchingIllustrator")
            .field("inner", &self.inner.backend_name())
            .finish()
    }
}

#[async_trait]
impl Illustrator for BatchingIllustrator {
    async fn illustrate(
        &self,
        request: &ImageRequest,
        context: &StoryContext,
    ) -> BabelResult<ImageAsset> {
        self.inner.illustrate(request, context).await
    }

    #[instrument(skip(self, requests, context), fields(backend = self.inner.backend_name(), pages = requests.len()))]
    async fn illustrate_batch(
        &self,
        requests: &[ImageRequest],
        context: &StoryContext,
    ) -> BabelResult<Vec<ImageAsset>> {
        let chunk_size = self.inner.max_batch_size().max(1);
        let mut images = Vec::with_capacity(requests.len());

        for (index, chunk) in requests.chunks(chunk_size).enumerate() {
            info!(batch = index + 1, size = chunk.len(), "Generating image batch");
            match self.inner.illustrate_batch(chunk, context).await {
                Ok(mut batch) => {
                    if batch.len() < chunk.len() {
                        warn!(
                            batch = index + 1,
                            expected = chunk.len(),
                            received = batch.len(),
                            "Padding short image batch with placeholders"
                        );
                        batch.resize_with(chunk.len(), placeholder_image);
                    }
                    batch.truncate(chunk.len());
                    images.extend(batch);
                }
                Err(e) => {
                    error!(batch = index + 1, error = %e, "Image batch failed, using placeholders");
                    images.extend(chunk.iter().map(|_| placeholder_image()));
                }
            }
        }

        Ok(images)
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    fn backend_name(&self) -> &'static str {
        "batching"
    }
}
