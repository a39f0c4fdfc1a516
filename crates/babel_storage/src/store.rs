//! Blob store trait.

use crate::{BlobMetadata, BlobReference};
use babel_error::BabelResult;

/// Pluggable object storage for page assets.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a key, replacing any existing object.
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        metadata: &BlobMetadata,
    ) -> BabelResult<BlobReference>;

    /// Read an object's bytes.
    async fn get(&self, key: &str) -> BabelResult<Vec<u8>>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> BabelResult<bool>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> BabelResult<()>;

    /// Public URL an object is served from.
    fn public_url(&self, key: &str) -> String;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}
