//! Diesel row types for the jobs, stories and story_pages tables.

use crate::schema::{jobs, stories, story_pages};
use babel_core::{
    Job, JobId, JobStatus, Story, StoryBody, StoryId, StoryMetadata, StoryPage, StoryProgress,
    StoryStatus,
};
use babel_error::{DatabaseError, DatabaseErrorKind};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

/// Database row for the jobs table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Identifiable)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub status: String,
    pub data: serde_json::Value,
    pub attempts: i32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    /// Hydrate the domain job, rejecting unknown statuses and malformed payloads.
    pub fn into_job(self) -> Result<Job, DatabaseError> {
        let status = JobStatus::from_str(&self.status).map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                "unknown job status '{}'",
                self.status
            )))
        })?;
        let data = serde_json::from_value(self.data)?;
        Ok(Job::new(
            JobId::from(self.id),
            StoryId::from(self.story_id),
            status,
            data,
            u32::try_from(self.attempts).unwrap_or_default(),
            self.error,
            self.created_at,
        ))
    }
}

/// Insertable struct for the jobs table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJobRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub status: String,
    pub data: serde_json::Value,
}

/// Database row for the stories table.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = stories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoryRow {
    pub id: Uuid,
    pub status: String,
    pub progress: Option<serde_json::Value>,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub total_pages: Option<i32>,
    pub text_generated: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StoryRow {
    /// Parse the stored status string.
    pub fn story_status(&self) -> Result<StoryStatus, DatabaseError> {
        StoryStatus::from_str(&self.status).map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                "unknown story status '{}'",
                self.status
            )))
        })
    }

    /// Hydrate the story document from its row and page rows.
    pub fn into_story(self, pages: Vec<PageRow>) -> Result<Story, DatabaseError> {
        let status = self.story_status()?;
        let progress: Option<StoryProgress> =
            self.progress.map(serde_json::from_value).transpose()?;
        let metadata: Option<StoryMetadata> =
            self.metadata.map(serde_json::from_value).transpose()?;
        let pages = pages
            .into_iter()
            .map(PageRow::into_page)
            .collect::<Result<Vec<_>, _>>()?;
        let body = StoryBody {
            title: self.title,
            metadata,
            pages,
            total_pages: self.total_pages.and_then(|n| u32::try_from(n).ok()),
        };
        Ok(Story::new(
            StoryId::from(self.id),
            status,
            progress,
            body,
            self.text_generated,
            self.error,
            self.created_at,
            self.updated_at,
            self.completed_at,
        ))
    }
}

/// Insertable struct for the stories table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stories)]
pub struct NewStoryRow {
    pub id: Uuid,
    pub status: String,
}

/// Status transition written to a story. `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = stories)]
pub struct StoryStatusChange {
    pub status: String,
    pub progress: Option<serde_json::Value>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Title and metadata written once the text is generated.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = stories)]
pub struct StoryTextRow {
    pub id: Uuid,
    pub status: String,
    pub progress: Option<serde_json::Value>,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub total_pages: Option<i32>,
    pub text_generated: bool,
    pub updated_at: DateTime<Utc>,
}

/// Database row for the story_pages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = story_pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PageRow {
    pub story_id: Uuid,
    pub page_number: i32,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PageRow {
    fn into_page(self) -> Result<StoryPage, DatabaseError> {
        Ok(serde_json::from_value(self.content)?)
    }
}

/// Insertable struct for the story_pages table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = story_pages)]
pub struct NewPageRow {
    pub story_id: Uuid,
    pub page_number: i32,
    pub content: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
