//! Mock backends for generator tests.

use async_trait::async_trait;
use babel_core::{AudioClip, ImageAsset};
use babel_error::{BabelResult, GenerationError, GenerationErrorKind};
use babel_interface::{ImageRequest, Illustrator, NarrationRequest, Narrator, StoryContext};
use std::sync::{Arc, Mutex};

/// How a mock illustrator answers a batch.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockImageBehavior {
    /// One image per request
    Success,
    /// Every call fails
    Error,
    /// Only the first call fails
    FailFirst,
    /// Return this many images regardless of the request size
    Fixed(usize),
}

/// Illustrator that records batch sizes.
pub struct MockIllustrator {
    behavior: MockImageBehavior,
    max_batch: usize,
    batches: Arc<Mutex<Vec<usize>>>,
}

#[allow(dead_code)]
impl MockIllustrator {
    pub fn new(behavior: MockImageBehavior, max_batch: usize) -> Self {
        Self {
            behavior,
            max_batch,
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sizes of every batch call, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().expect("lock").clone()
    }

    fn image(page: u32) -> ImageAsset {
        ImageAsset::generated(vec![page as u8; 4], "png")
    }
}

#[async_trait]
impl Illustrator for MockIllustrator {
    async fn illustrate(
        &self,
        request: &ImageRequest,
        _context: &StoryContext,
    ) -> BabelResult<ImageAsset> {
        match self.behavior {
            MockImageBehavior::Error => Err(GenerationError::new(GenerationErrorKind::Image(
                "mock failure".to_string(),
            ))
            .into()),
            _ => Ok(Self::image(request.page_number)),
        }
    }

    async fn illustrate_batch(
        &self,
        requests: &[ImageRequest],
        _context: &StoryContext,
    ) -> BabelResult<Vec<ImageAsset>> {
        let call_index = {
            let mut batches = self.batches.lock().expect("lock");
            batches.push(requests.len());
            batches.len() - 1
        };
        let fail = match self.behavior {
            MockImageBehavior::Error => true,
            MockImageBehavior::FailFirst => call_index == 0,
            _ => false,
        };
        if fail {
            return Err(GenerationError::new(GenerationErrorKind::Http {
                status_code: 500,
                message: "mock batch failure".to_string(),
            })
            .into());
        }
        let count = match self.behavior {
            MockImageBehavior::Fixed(n) => n,
            _ => requests.len(),
        };
        Ok((0..count)
            .map(|i| Self::image(requests.get(i).map(|r| r.page_number).unwrap_or(99)))
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch
    }

    fn backend_name(&self) -> &'static str {
        "mock-images"
    }
}

/// Narrator that succeeds or fails and counts calls.
pub struct MockNarrator {
    name: &'static str,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

#[allow(dead_code)]
impl MockNarrator {
    pub fn succeeding(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            fail: true,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> BabelResult<AudioClip> {
        *self.calls.lock().expect("lock") += 1;
        if self.fail {
            return Err(GenerationError::new(GenerationErrorKind::Audio(format!(
                "{} failed",
                self.name
            )))
            .into());
        }
        Ok(AudioClip {
            bytes: self.name.as_bytes().to_vec(),
            format: "mp3".to_string(),
            duration_secs: 1.5,
        })
    }

    fn backend_name(&self) -> &'static str {
        self.name
    }
}

/// Silent MPEG-1 Layer III frames: mono, 48 kHz, 128 kbps.
pub fn silent_mp3(frames: usize) -> Vec<u8> {
    let mut frame = vec![0u8; 384];
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x94, 0xC0]);
    frame.repeat(frames)
}

/// Narrator answering with real MP3, like the baseline speech endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Mp3Narrator {
    pub frames: usize,
}

#[async_trait]
impl Narrator for Mp3Narrator {
    async fn narrate(&self, _request: &NarrationRequest) -> BabelResult<AudioClip> {
        Ok(AudioClip {
            bytes: silent_mp3(self.frames),
            format: "mp3".to_string(),
            duration_secs: 0.5,
        })
    }

    fn backend_name(&self) -> &'static str {
        "mp3"
    }
}
