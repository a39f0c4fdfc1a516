//! PostgreSQL implementation of the job queue and story store.

use crate::models::{
    JobRow, NewJobRow, NewPageRow, NewStoryRow, PageRow, StoryRow, StoryStatusChange,
    StoryTextRow,
};
use crate::schema::{jobs, stories, story_pages};
use crate::{PgPool, run_migrations};
use async_trait::async_trait;
use babel_core::{
    Job, JobCounts, JobId, JobRequest, JobStatus, Story, StoryId, StoryMetadata, StoryPage,
    StoryProgress, StoryStatus,
};
use babel_error::{
    BabelResult, DatabaseError, DatabaseErrorKind, PipelineError, PipelineErrorKind,
};
use babel_interface::{JobQueue, StoryStore};
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;

/// Claim the oldest pending job. Concurrent claimers skip rows another
/// transaction has locked, so each job is handed to exactly one worker.
const CLAIM_NEXT_JOB: &str = "\
UPDATE jobs SET status = 'processing', updated_at = now() \
WHERE id = ( \
    SELECT id FROM jobs WHERE status = 'pending' \
    ORDER BY created_at, id \
    LIMIT 1 \
    FOR UPDATE SKIP LOCKED \
) \
RETURNING id, story_id, status, data, attempts, error, created_at, updated_at";

/// Job queue and story store backed by PostgreSQL.
///
/// Diesel is synchronous, so every call checks a connection out of the pool
/// inside `spawn_blocking`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations on a pooled connection.
    pub async fn migrate(&self) -> BabelResult<()> {
        self.with_conn("migrate", |conn| Ok(run_migrations(conn)?))
            .await
    }

    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> BabelResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BabelResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(DatabaseError::from)?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Task(format!("{operation}: {e}"))))?
    }
}

/// Load and lock a story that may still be written to.
fn writable_story(conn: &mut PgConnection, id: Uuid) -> BabelResult<StoryRow> {
    let row = stories::table
        .find(id)
        .select(StoryRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| PipelineError::new(PipelineErrorKind::StoryNotFound(id.to_string())))?;
    if row.story_status()? == StoryStatus::Completed {
        return Err(PipelineError::new(PipelineErrorKind::StoryCompleted(id.to_string())).into());
    }
    Ok(row)
}

fn to_json<T: serde::Serialize>(value: &T) -> BabelResult<serde_json::Value> {
    Ok(serde_json::to_value(value).map_err(DatabaseError::from)?)
}

fn page_count(total_pages: u32) -> i32 {
    i32::try_from(total_pages).unwrap_or(i32::MAX)
}

/// Fail a claimed job whose stored payload cannot be decoded, along with its story.
fn fail_undecodable(conn: &mut PgConnection, row: &JobRow, reason: &str) -> BabelResult<()> {
    let now = Utc::now();
    let message = format!("invalid job payload: {reason}");
    diesel::update(jobs::table.find(row.id))
        .set((
            jobs::status.eq(JobStatus::Failed.as_str()),
            jobs::error.eq(Some(message.clone())),
            jobs::attempts.eq(jobs::attempts + 1),
            jobs::updated_at.eq(now),
        ))
        .execute(conn)?;
    diesel::update(stories::table.find(row.story_id))
        .filter(stories::status.ne(StoryStatus::Completed.as_str()))
        .set(StoryStatusChange {
            status: StoryStatus::Failed.as_str().to_string(),
            progress: None,
            error: Some(message),
            completed_at: None,
            updated_at: now,
        })
        .execute(conn)?;
    Ok(())
}

#[async_trait]
impl JobQueue for PostgresStore {
    #[instrument(skip(self))]
    async fn claim_next(&self) -> BabelResult<Option<Job>> {
        self.with_conn("claim_next", |conn| {
            let Some(row) = diesel::sql_query(CLAIM_NEXT_JOB)
                .get_result::<JobRow>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            match row.clone().into_job() {
                Ok(job) => {
                    tracing::debug!(job_id = %job.id(), story_id = %job.story_id(), "Claimed job");
                    Ok(Some(job))
                }
                Err(e) => {
                    tracing::warn!(job_id = %row.id, error = %e, "Claimed job has an undecodable payload");
                    fail_undecodable(conn, &row, &e.kind.to_string())?;
                    Ok(None)
                }
            }
        })
        .await
    }

    #[instrument(skip(self))]
    async fn complete_job(&self, id: JobId) -> BabelResult<()> {
        let uuid = *id.as_uuid();
        self.with_conn("complete_job", move |conn| {
            let updated = diesel::update(jobs::table.find(uuid))
                .set((
                    jobs::status.eq(JobStatus::Completed.as_str()),
                    jobs::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Err(PipelineError::new(PipelineErrorKind::JobNotFound(uuid.to_string())).into());
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, error))]
    async fn fail_job(&self, id: JobId, error: &str) -> BabelResult<()> {
        let uuid = *id.as_uuid();
        let error = error.to_string();
        self.with_conn("fail_job", move |conn| {
            let updated = diesel::update(jobs::table.find(uuid))
                .set((
                    jobs::status.eq(JobStatus::Failed.as_str()),
                    jobs::error.eq(Some(error)),
                    jobs::attempts.eq(jobs::attempts + 1),
                    jobs::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Err(PipelineError::new(PipelineErrorKind::JobNotFound(uuid.to_string())).into());
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, request))]
    async fn enqueue(&self, request: JobRequest) -> BabelResult<(JobId, StoryId)> {
        let data = to_json(&request)?;
        let job_id = JobId::new();
        let story_id = StoryId::new();
        self.with_conn("enqueue", move |conn| {
            conn.transaction::<_, babel_error::BabelError, _>(|conn| {
                diesel::insert_into(stories::table)
                    .values(NewStoryRow {
                        id: *story_id.as_uuid(),
                        status: StoryStatus::Pending.as_str().to_string(),
                    })
                    .execute(conn)?;
                diesel::insert_into(jobs::table)
                    .values(NewJobRow {
                        id: *job_id.as_uuid(),
                        story_id: *story_id.as_uuid(),
                        status: JobStatus::Pending.as_str().to_string(),
                        data,
                    })
                    .execute(conn)?;
                Ok(())
            })
        })
        .await?;
        tracing::info!(%job_id, %story_id, "Enqueued story job");
        Ok((job_id, story_id))
    }

    #[instrument(skip(self))]
    async fn requeue_story(&self, story_id: StoryId) -> BabelResult<JobId> {
        let uuid = *story_id.as_uuid();
        self.with_conn("requeue_story", move |conn| {
            conn.transaction::<_, babel_error::BabelError, _>(|conn| {
                writable_story(conn, uuid)?;
                let job_id = jobs::table
                    .filter(jobs::story_id.eq(uuid))
                    .order(jobs::created_at.desc())
                    .select(jobs::id)
                    .first::<Uuid>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        PipelineError::new(PipelineErrorKind::JobNotFound(format!(
                            "no job for story {uuid}"
                        )))
                    })?;
                let now = Utc::now();
                diesel::update(stories::table.find(uuid))
                    .set((
                        stories::status.eq(StoryStatus::Pending.as_str()),
                        stories::progress.eq(None::<serde_json::Value>),
                        stories::title.eq(None::<String>),
                        stories::metadata.eq(None::<serde_json::Value>),
                        stories::total_pages.eq(None::<i32>),
                        stories::text_generated.eq(false),
                        stories::error.eq(None::<String>),
                        stories::completed_at.eq(None::<DateTime<Utc>>),
                        stories::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                diesel::delete(story_pages::table.filter(story_pages::story_id.eq(uuid)))
                    .execute(conn)?;
                diesel::update(jobs::table.find(job_id))
                    .set((
                        jobs::status.eq(JobStatus::Pending.as_str()),
                        jobs::error.eq(None::<String>),
                        jobs::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                Ok(JobId::from(job_id))
            })
        })
        .await
    }

    async fn count_by_status(&self) -> BabelResult<JobCounts> {
        self.with_conn("count_by_status", |conn| {
            let rows = jobs::table
                .group_by(jobs::status)
                .select((jobs::status, diesel::dsl::count_star()))
                .load::<(String, i64)>(conn)?;
            let mut counts = JobCounts::default();
            for (status, count) in rows {
                let count = u64::try_from(count).unwrap_or_default();
                match JobStatus::from_str(&status) {
                    Ok(JobStatus::Pending) => counts.pending = count,
                    Ok(JobStatus::Processing) => counts.processing = count,
                    Ok(JobStatus::Completed) => counts.completed = count,
                    Ok(JobStatus::Failed) => counts.failed = count,
                    Err(_) => tracing::warn!(%status, "Ignoring jobs with unknown status"),
                }
            }
            Ok(counts)
        })
        .await
    }

    async fn ping(&self) -> BabelResult<()> {
        self.with_conn("ping", |conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl StoryStore for PostgresStore {
    #[instrument(skip(self, progress, error))]
    async fn update_status(
        &self,
        id: StoryId,
        status: StoryStatus,
        progress: Option<StoryProgress>,
        error: Option<&str>,
    ) -> BabelResult<()> {
        let uuid = *id.as_uuid();
        let progress = progress.as_ref().map(to_json).transpose()?;
        let error = error.map(str::to_string);
        self.with_conn("update_status", move |conn| {
            writable_story(conn, uuid)?;
            let now = Utc::now();
            diesel::update(stories::table.find(uuid))
                .filter(stories::status.ne(StoryStatus::Completed.as_str()))
                .set(StoryStatusChange {
                    status: status.as_str().to_string(),
                    progress,
                    error,
                    completed_at: (status == StoryStatus::Completed).then_some(now),
                    updated_at: now,
                })
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, title, metadata))]
    async fn save_metadata(
        &self,
        id: StoryId,
        title: &str,
        metadata: &StoryMetadata,
        total_pages: u32,
    ) -> BabelResult<()> {
        let uuid = *id.as_uuid();
        let row = StoryTextRow {
            id: uuid,
            status: StoryStatus::GeneratingAssets.as_str().to_string(),
            progress: Some(to_json(&StoryProgress::of_total(total_pages))?),
            title: Some(title.to_string()),
            metadata: Some(to_json(metadata)?),
            total_pages: Some(page_count(total_pages)),
            text_generated: true,
            updated_at: Utc::now(),
        };
        self.with_conn("save_metadata", move |conn| {
            conn.transaction::<_, babel_error::BabelError, _>(|conn| {
                let existing = stories::table
                    .find(uuid)
                    .select(stories::status)
                    .first::<String>(conn)
                    .optional()?;
                if existing.as_deref() == Some(StoryStatus::Completed.as_str()) {
                    return Err(
                        PipelineError::new(PipelineErrorKind::StoryCompleted(uuid.to_string()))
                            .into(),
                    );
                }
                diesel::insert_into(stories::table)
                    .values(&row)
                    .on_conflict(stories::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                diesel::delete(story_pages::table.filter(story_pages::story_id.eq(uuid)))
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self, page), fields(page_number = page.page_number))]
    async fn save_page(&self, id: StoryId, page: &StoryPage) -> BabelResult<()> {
        let uuid = *id.as_uuid();
        let page_number = page.page_number;
        let new_page = NewPageRow {
            story_id: uuid,
            page_number: page_count(page_number),
            content: to_json(page)?,
            updated_at: Utc::now(),
        };
        self.with_conn("save_page", move |conn| {
            conn.transaction::<_, babel_error::BabelError, _>(|conn| {
                let total_pages = writable_story(conn, uuid)?
                    .total_pages
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        PipelineError::new(PipelineErrorKind::MetadataMissing(uuid.to_string()))
                    })?;
                if page_number == 0 || page_number > total_pages {
                    return Err(PipelineError::new(PipelineErrorKind::PageOutOfRange {
                        page: page_number,
                        total: total_pages,
                    })
                    .into());
                }
                diesel::insert_into(story_pages::table)
                    .values(&new_page)
                    .on_conflict((story_pages::story_id, story_pages::page_number))
                    .do_update()
                    .set((
                        story_pages::content.eq(excluded(story_pages::content)),
                        story_pages::updated_at.eq(excluded(story_pages::updated_at)),
                    ))
                    .execute(conn)?;
                let completed_pages = story_pages::table
                    .filter(story_pages::story_id.eq(uuid))
                    .order(story_pages::page_number.asc())
                    .select(story_pages::page_number)
                    .load::<i32>(conn)?
                    .into_iter()
                    .filter_map(|n| u32::try_from(n).ok())
                    .collect();
                let progress = StoryProgress {
                    current_page: Some(page_number),
                    total_pages: Some(total_pages),
                    completed_pages,
                };
                diesel::update(stories::table.find(uuid))
                    .set((
                        stories::progress.eq(Some(to_json(&progress)?)),
                        stories::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn mark_completed(&self, id: StoryId) -> BabelResult<()> {
        let uuid = *id.as_uuid();
        self.with_conn("mark_completed", move |conn| {
            let status = stories::table
                .find(uuid)
                .select(stories::status)
                .first::<String>(conn)
                .optional()?
                .ok_or_else(|| {
                    PipelineError::new(PipelineErrorKind::StoryNotFound(uuid.to_string()))
                })?;
            if status == StoryStatus::Completed.as_str() {
                return Ok(());
            }
            let now = Utc::now();
            diesel::update(stories::table.find(uuid))
                .set((
                    stories::status.eq(StoryStatus::Completed.as_str()),
                    stories::completed_at.eq(Some(now)),
                    stories::updated_at.eq(now),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn get_story(&self, id: StoryId) -> BabelResult<Option<Story>> {
        let uuid = *id.as_uuid();
        self.with_conn("get_story", move |conn| {
            let Some(row) = stories::table
                .find(uuid)
                .select(StoryRow::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let pages = story_pages::table
                .filter(story_pages::story_id.eq(uuid))
                .order(story_pages::page_number.asc())
                .select(PageRow::as_select())
                .load(conn)?;
            Ok(Some(row.into_story(pages)?))
        })
        .await
    }
}
