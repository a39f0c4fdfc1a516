//! HTTP surface: banner, health, job metrics and the manual requeue trigger.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use babel_core::StoryId;
use babel_error::{BabelErrorKind, PipelineErrorKind};
use babel_interface::JobQueue;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Whether the coordinator task is running.
#[derive(Debug, Clone, Default)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    /// Mark the coordinator alive until the returned guard is dropped.
    pub fn alive(&self) -> LivenessGuard {
        self.0.store(true, Ordering::SeqCst);
        LivenessGuard(Arc::clone(&self.0))
    }

    /// True while a guard is held.
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Clears the liveness flag on drop, including when the coordinator task panics.
#[derive(Debug)]
pub struct LivenessGuard(Arc<AtomicBool>);

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// API state shared by the handlers.
#[derive(Clone)]
pub struct ApiState {
    queue: Arc<dyn JobQueue>,
    liveness: Liveness,
}

impl ApiState {
    /// Creates new API state.
    pub fn new(queue: Arc<dyn JobQueue>, liveness: Liveness) -> Self {
        Self { queue, liveness }
    }
}

/// Creates the service router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/process/:story_id", post(requeue_story))
        .with_state(state)
}

async fn banner() -> impl IntoResponse {
    Json(json!({
        "service": "babel-worker",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// 200 only when the store answers and the coordinator is running.
async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    let database = state.queue.ping().await;
    let coordinator = state.liveness.is_alive();
    let healthy = database.is_ok() && coordinator;

    let body = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "database": if database.is_ok() { "connected" } else { "disconnected" },
        "coordinator": if coordinator { "running" } else { "stopped" },
    });
    if let Err(e) = database {
        warn!(error = %e, "Health check could not reach the store");
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn get_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match state.queue.count_by_status().await {
        Ok(counts) => (
            StatusCode::OK,
            Json(json!({
                "jobs": counts,
                "coordinator": if state.liveness.is_alive() { "running" } else { "stopped" },
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.summary() })),
        ),
    }
}

async fn requeue_story(
    State(state): State<ApiState>,
    Path(story_id): Path<String>,
) -> impl IntoResponse {
    let Ok(story_id) = story_id.parse::<StoryId>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid story id '{story_id}'") })),
        );
    };

    match state.queue.requeue_story(story_id).await {
        Ok(job_id) => {
            info!(%story_id, %job_id, "Story requeued");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "storyId": story_id, "jobId": job_id, "status": "pending" })),
            )
        }
        Err(e) => {
            let status = match e.kind() {
                BabelErrorKind::Pipeline(p) => match &p.kind {
                    PipelineErrorKind::StoryNotFound(_) | PipelineErrorKind::JobNotFound(_) => {
                        StatusCode::NOT_FOUND
                    }
                    PipelineErrorKind::StoryCompleted(_) => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                },
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(%story_id, error = %e, "Requeue rejected");
            (status, Json(json!({ "error": e.summary() })))
        }
    }
}
