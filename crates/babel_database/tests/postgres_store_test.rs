//! Queue and store behavior against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test -p babel_database -- --ignored`

mod test_utils;

use babel_database::{PostgresStore, establish_pool};
use babel_interface::JobQueue;
use diesel::RunQueryDsl;

async fn store() -> anyhow::Result<PostgresStore> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL")?;
    let store = PostgresStore::new(establish_pool(&url, 4)?);
    store.migrate().await?;
    Ok(store)
}

async fn truncate(store: &PostgresStore) -> anyhow::Result<()> {
    let pool = store.pool().clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut conn = pool.get()?;
        diesel::sql_query("TRUNCATE story_pages, jobs, stories").execute(&mut conn)?;
        Ok(())
    })
    .await?
}

// One test drives every case in sequence so runs never race on the shared tables.
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_contract() -> anyhow::Result<()> {
    let store = store().await?;
    store.ping().await?;

    truncate(&store).await?;
    test_utils::claims_oldest_first(&store).await?;
    truncate(&store).await?;
    test_utils::failure_records_error_and_attempt(&store).await?;
    truncate(&store).await?;
    test_utils::progressive_writes(&store).await?;
    truncate(&store).await?;
    test_utils::pages_outside_range_are_rejected(&store).await?;
    truncate(&store).await?;
    test_utils::pages_need_stored_metadata(&store).await?;
    truncate(&store).await?;
    test_utils::completed_stories_are_frozen(&store).await?;
    truncate(&store).await?;
    test_utils::requeue_resets_story_and_job(&store).await?;
    truncate(&store).await?;
    test_utils::missing_records_are_reported(&store).await?;
    Ok(())
}
