//! Ordered narrator fallback.

use async_trait::async_trait;
use babel_core::AudioClip;
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::{NarrationRequest, Narrator};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Tries narrators in order and returns the first success.
///
/// If every tier fails, the last error is returned for the caller to isolate.
#[derive(Clone)]
pub struct FallbackNarrator {
    tiers: Vec<Arc<dyn Narrator>>,
}

impl FallbackNarrator {
    /// Create a chain; earlier tiers are preferred.
    pub fn new(tiers: Vec<Arc<dyn Narrator>>) -> Self {
        Self { tiers }
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// True if there are no tiers.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl std::fmt::Debug for FallbackNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.tiers.iter().map(|t| t.backend_name()).collect();
        f.debug_struct("FallbackNarrator").field("tiers", &names).finish()
    }
}

#[async_trait]
impl Narrator for FallbackNarrator {
    #[instrument(skip(self, request), fields(page = request.page_number))]
    async fn narrate(&self, request: &NarrationRequest) -> BabelResult<AudioClip> {
        let mut last_error = None;
        for (index, tier) in self.tiers.iter().enumerate() {
            match tier.narrate(request).await {
                Ok(clip) => {
                    if index > 0 {
                        info!(backend = tier.backend_name(), "Narrated with fallback backend");
                    }
                    return Ok(clip);
                }
                Err(e) => {
                    warn!(backend = tier.backend_name(), error = %e, "Narration backend failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            GenerationError::new(GenerationErrorKind::Unavailable(
                "no narration backend configured".to_string(),
            ))
            .into()
        }))
    }

    fn backend_name(&self) -> &'static str {
        self.tiers
            .first()
            .map(|tier| tier.backend_name())
            .unwrap_or("none")
    }
}
