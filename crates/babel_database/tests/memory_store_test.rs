//! Queue and store behavior of the in-memory backend.

mod test_utils;

use babel_database::InMemoryStore;
use babel_interface::JobQueue;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_claims_oldest_first() -> anyhow::Result<()> {
    test_utils::claims_oldest_first(&InMemoryStore::new()).await
}

#[tokio::test]
async fn test_failure_records_error_and_attempt() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    test_utils::failure_records_error_and_attempt(&store).await?;
    let job = store.jobs().pop().expect("one job");
    assert_eq!(job.error().as_deref(), Some("text model unavailable"));
    assert_eq!(*job.attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_progressive_writes() -> anyhow::Result<()> {
    test_utils::progressive_writes(&InMemoryStore::new()).await
}

#[tokio::test]
async fn test_pages_outside_range_are_rejected() -> anyhow::Result<()> {
    test_utils::pages_outside_range_are_rejected(&InMemoryStore::new()).await
}

#[tokio::test]
async fn test_pages_need_stored_metadata() -> anyhow::Result<()> {
    test_utils::pages_need_stored_metadata(&InMemoryStore::new()).await
}

#[tokio::test]
async fn test_completed_stories_are_frozen() -> anyhow::Result<()> {
    test_utils::completed_stories_are_frozen(&InMemoryStore::new()).await
}

#[tokio::test]
async fn test_requeue_resets_story_and_job() -> anyhow::Result<()> {
    test_utils::requeue_resets_story_and_job(&InMemoryStore::new()).await
}

#[tokio::test]
async fn test_missing_records_are_reported() -> anyhow::Result<()> {
    test_utils::missing_records_are_reported(&InMemoryStore::new()).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_hand_out_each_job_once() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::new());
    for n in 0..20 {
        store.enqueue(test_utils::request(&format!("story {n}"))).await?;
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut claimed = Vec::new();
            while let Some(job) = store.claim_next().await.expect("claim") {
                claimed.push(*job.id());
            }
            claimed
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.await? {
            assert!(seen.insert(id), "job {id} claimed twice");
        }
    }
    assert_eq!(seen.len(), 20);
    assert_eq!(store.count_by_status().await?.processing, 20);
    Ok(())
}
