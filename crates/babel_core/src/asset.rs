//! Generated media and where it ends up.

use serde::{Deserialize, Serialize};

/// An illustration produced for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Short format name, e.g. "png"
    pub format: String,
    /// True when the bytes are the fallback image rather than a generated one
    pub placeholder: bool,
}

impl ImageAsset {
    /// A generated image.
    pub fn generated(bytes: Vec<u8>, format: impl Into<String>) -> Self {
        Self {
            bytes,
            format: format.into(),
            placeholder: false,
        }
    }

    /// The fallback image.
    pub fn placeholder(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: "png".to_string(),
            placeholder: true,
        }
    }

    /// MIME type for blob uploads.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.format)
    }
}

/// Narration audio for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Encoded audio bytes
    pub bytes: Vec<u8>,
    /// Short format name, e.g. "wav"
    pub format: String,
    /// Playback length in seconds
    pub duration_secs: f32,
}

impl AudioClip {
    /// MIME type for blob uploads.
    pub fn content_type(&self) -> String {
        format!("audio/{}", self.format)
    }
}

/// Where a persisted asset's bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetLocation {
    /// Uploaded to blob storage
    Blob {
        /// Public URL
        url: String,
        /// Storage key
        key: String,
        /// MIME type
        #[serde(rename = "contentType")]
        content_type: String,
        /// Object size
        #[serde(rename = "sizeBytes")]
        size_bytes: u64,
    },
    /// Embedded as base64
    Inline {
        /// Base64 payload
        #[serde(alias = "imageData", alias = "audioData")]
        data: String,
    },
}

impl AssetLocation {
    /// True when the asset was offloaded to blob storage.
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob { .. })
    }
}

/// Image attached to a persisted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// Where the bytes are
    #[serde(flatten)]
    pub location: AssetLocation,
    /// Short format name
    pub format: String,
    /// Set when the placeholder was used
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

/// Narration attached to a persisted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAudio {
    /// Where the bytes are
    #[serde(flatten)]
    pub location: AssetLocation,
    /// Short format name
    pub format: String,
    /// Playback length in seconds
    pub duration: f32,
}
