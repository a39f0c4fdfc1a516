//! Object key layout.

use babel_core::StoryId;
use babel_error::{StorageError, StorageErrorKind};

/// Kind of page asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
    /// Illustration
    Image,
    /// Narration
    Audio,
}

impl AssetKind {
    /// MIME type for a format of this kind.
    pub fn content_type(&self, format: &str) -> String {
        format!("{self}/{format}")
    }
}

/// Key for a page asset: `stories/{storyId}/page-{n}-{kind}-{timestampMs}.{format}`.
///
/// ```
/// use babel_core::StoryId;
/// use babel_storage::{AssetKind, asset_key};
///
/// let id: StoryId = "6f1c2d0e-8f57-4a53-9d7e-0a4a0a2d6b11".parse().unwrap();
/// assert_eq!(
///     asset_key(id, 3, AssetKind::Audio, 1700000000000, "wav"),
///     "stories/6f1c2d0e-8f57-4a53-9d7e-0a4a0a2d6b11/page-3-audio-1700000000000.wav"
/// );
/// ```
pub fn asset_key(
    story_id: StoryId,
    page_number: u32,
    kind: AssetKind,
    timestamp_ms: i64,
    format: &str,
) -> String {
    format!("stories/{story_id}/page-{page_number}-{kind}-{timestamp_ms}.{format}")
}

/// Reject keys that are empty, absolute or escape the store root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(StorageError::new(StorageErrorKind::InvalidKey(
            key.to_string(),
        )));
    }
    Ok(())
}
