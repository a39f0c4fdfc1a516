//! Placeholder illustrations.

use crate::png;
use async_trait::async_trait;
use babel_core::ImageAsset;
use babel_error::BabelResult;
use babel_interface::{ImageRequest, Illustrator, StoryContext};
use std::sync::LazyLock;

/// Sky blue, 1024x768.
static PLACEHOLDER_PNG: LazyLock<Vec<u8>> =
    LazyLock::new(|| png::solid_rgb(1024, 768, [135, 206, 235]));

/// The deterministic stand-in image used whenever illustration fails or is disabled.
pub fn placeholder_image() -> ImageAsset {
    ImageAsset::placeholder(PLACEHOLDER_PNG.clone())
}

/// Illustrator that always returns the placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderIllustrator;

impl PlaceholderIllustrator {
    /// Create an illustrator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Illustrator for PlaceholderIllustrator {
    async fn illustrate(
        &self,
        _request: &ImageRequest,
        _context: &StoryContext,
    ) -> BabelResult<ImageAsset> {
        Ok(placeholder_image())
    }

    async fn illustrate_batch(
        &self,
        requests: &[ImageRequest],
        _context: &StoryContext,
    ) -> BabelResult<Vec<ImageAsset>> {
        Ok(requests.iter().map(|_| placeholder_image()).collect())
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    fn backend_name(&self) -> &'static str {
        "placeholder"
    }
}
