//! Tests for the blob store backends.

use babel_core::StoryId;
use babel_error::{BabelErrorKind, StorageErrorKind};
use babel_storage::{
    AssetKind, BlobMetadata, BlobStore, FileSystemBlobStore, MemoryBlobStore, asset_key,
};
use tempfile::TempDir;

fn create_store() -> anyhow::Result<(FileSystemBlobStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = FileSystemBlobStore::new(temp_dir.path(), "https://assets.example.com/")?;
    Ok((store, temp_dir))
}

#[tokio::test]
async fn test_put_and_get() -> anyhow::Result<()> {
    let (store, temp_dir) = create_store()?;
    let key = asset_key(StoryId::new(), 1, AssetKind::Image, 1_700_000_000_000, "png");
    let data = b"fake png bytes";

    let reference = store
        .put(key.as_str(), data, &BlobMetadata::new("image/png"))
        .await?;

    assert_eq!(reference.key, key);
    assert_eq!(reference.url, format!("https://assets.example.com/{key}"));
    assert_eq!(reference.content_type, "image/png");
    assert_eq!(reference.size_bytes, data.len() as u64);
    assert_eq!(reference.content_hash.len(), 64);
    assert!(temp_dir.path().join(&key).exists());

    let retrieved = store.get(&key).await?;
    assert_eq!(retrieved, data);
    Ok(())
}

#[tokio::test]
async fn test_put_overwrites() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_store()?;
    let metadata = BlobMetadata::new("audio/wav");
    store.put("stories/a/page-1-audio-1.wav", b"first", &metadata).await?;
    store.put("stories/a/page-1-audio-1.wav", b"second", &metadata).await?;
    assert_eq!(store.get("stories/a/page-1-audio-1.wav").await?, b"second");
    Ok(())
}

#[tokio::test]
async fn test_exists_and_delete() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_store()?;
    let key = "stories/s/page-2-image-5.png";
    assert!(!store.exists(key).await?);

    store.put(key, b"data", &BlobMetadata::new("image/png")).await?;
    assert!(store.exists(key).await?);

    store.delete(key).await?;
    assert!(!store.exists(key).await?);
    Ok(())
}

#[tokio::test]
async fn test_get_missing_is_not_found() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_store()?;
    let err = store
        .get("stories/none/page-1-image-1.png")
        .await
        .expect_err("missing object");
    match err.kind() {
        BabelErrorKind::Storage(e) => assert!(matches!(e.kind, StorageErrorKind::NotFound(_))),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_rejects_escaping_keys() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_store()?;
    for key in ["", "/etc/passwd", "stories/../../x", "stories//x"] {
        let result = store.put(key, b"x", &BlobMetadata::new("image/png")).await;
        assert!(result.is_err(), "key {key:?} should be rejected");
    }
    Ok(())
}

#[tokio::test]
async fn test_memory_store() -> anyhow::Result<()> {
    let store = MemoryBlobStore::new();
    let metadata = BlobMetadata::new("image/png").with_tag("pageNumber", 1);
    let reference = store.put("stories/x/page-1-image-9.png", b"abc", &metadata).await?;

    assert_eq!(reference.url, "memory://stories/x/page-1-image-9.png");
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.content_type("stories/x/page-1-image-9.png").as_deref(),
        Some("image/png")
    );
    assert_eq!(store.get("stories/x/page-1-image-9.png").await?, b"abc");

    store.delete("stories/x/page-1-image-9.png").await?;
    assert!(store.is_empty());
    assert!(store.delete("stories/x/page-1-image-9.png").await.is_err());
    Ok(())
}

#[test]
fn test_asset_kind_content_type() {
    assert_eq!(AssetKind::Image.content_type("png"), "image/png");
    assert_eq!(AssetKind::Audio.content_type("mp3"), "audio/mp3");
}
