//! In-memory blob store.

use crate::{BlobMetadata, BlobReference, BlobStore, validate_key};
use babel_error::{BabelResult, StorageError, StorageErrorKind};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// Blob store backed by a map, served from `memory://{key}`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Content type of a stored object.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .get(key)
            .map(|object| object.content_type.clone())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        metadata: &BlobMetadata,
    ) -> BabelResult<BlobReference> {
        validate_key(key)?;
        let hash = format!("{:x}", Sha256::digest(data));
        self.objects.lock().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: metadata.content_type.clone(),
            },
        );
        Ok(BlobReference {
            key: key.to_string(),
            url: self.public_url(key),
            content_type: metadata.content_type.clone(),
            size_bytes: data.len() as u64,
            content_hash: hash,
        })
    }

    async fn get(&self, key: &str) -> BabelResult<Vec<u8>> {
        self.objects
            .lock()
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(key.to_string())).into())
    }

    async fn exists(&self, key: &str) -> BabelResult<bool> {
        Ok(self.objects.lock().contains_key(key))
    }

    async fn delete(&self, key: &str) -> BabelResult<()> {
        match self.objects.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())).into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
