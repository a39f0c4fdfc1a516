//! Blob references and upload metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata supplied with an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// MIME type, e.g. "image/png"
    pub content_type: String,
    /// Free-form tags such as story id and page number
    pub tags: BTreeMap<String, String>,
}

impl BlobMetadata {
    /// Metadata with a content type and no tags.
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.tags.insert(key.into(), value.to_string());
        self
    }
}

/// Where an uploaded object lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobReference {
    /// Object key
    pub key: String,
    /// Public URL
    pub url: String,
    /// MIME type
    pub content_type: String,
    /// Object size
    pub size_bytes: u64,
    /// Hex SHA-256 of the bytes
    pub content_hash: String,
}
