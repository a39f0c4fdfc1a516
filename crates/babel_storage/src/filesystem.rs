//! Filesystem-backed blob store.

use crate::{BlobMetadata, BlobReference, BlobStore, validate_key};
use babel_error::{BabelResult, StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Blob store that writes objects to `{root}/{key}` and serves them from
/// `{public_url_base}/{key}`.
///
/// Writes go to a temporary file first and are renamed into place, so readers
/// never observe a partially written object.
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    root: PathBuf,
    public_url_base: String,
}

impl FileSystemBlobStore {
    /// Create a store, creating the root directory if needed.
    #[tracing::instrument(skip(root, public_url_base))]
    pub fn new(
        root: impl Into<PathBuf>,
        public_url_base: impl Into<String>,
    ) -> BabelResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        let public_url_base = public_url_base.into().trim_end_matches('/').to_string();
        tracing::info!(path = %root.display(), url = %public_url_base, "Created filesystem blob store");
        Ok(Self {
            root,
            public_url_base,
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemBlobStore {
    #[tracing::instrument(skip(self, data, metadata), fields(size = data.len(), content_type = %metadata.content_type))]
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        metadata: &BlobMetadata,
    ) -> BabelResult<BlobReference> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::ObjectWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::ObjectWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        let reference = BlobReference {
            key: key.to_string(),
            url: self.public_url(key),
            content_type: metadata.content_type.clone(),
            size_bytes: data.len() as u64,
            content_hash: Self::compute_hash(data),
        };
        tracing::info!(key, url = %reference.url, size = data.len(), "Stored blob");
        Ok(reference)
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> BabelResult<Vec<u8>> {
        let path = self.path_for(key)?;
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::ObjectRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;
        tracing::debug!(key, size = data.len(), "Read blob");
        Ok(data)
    }

    async fn exists(&self, key: &str) -> BabelResult<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::ObjectRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> BabelResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::ObjectWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;
        tracing::info!(key, "Deleted blob");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url_base, key)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
