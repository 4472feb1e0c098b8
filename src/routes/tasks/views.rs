use super::models::{
    BandmathRequest, RenderTask, TaskCreatedResponse, TaskKind, TaskQuery, TaskStatus,
    TaskStatusResponse, VisualRequest,
};
use super::orchestrator::{self, TaskRequest};
use crate::common::{
    error::{ApiError, ErrorBody},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tracing::info;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_visual, visual_status))
        .routes(routes!(create_bandmath, bandmath_status))
        .with_state(state.clone())
}

async fn create(
    state: &AppState,
    kind: TaskKind,
    params: super::models::TaskParams,
) -> Result<Json<TaskCreatedResponse>, ApiError> {
    let request = TaskRequest::new(kind, params)?;
    let provider = state.provider()?;
    let task = orchestrator::create_task(provider, request).await?;
    Ok(Json(TaskCreatedResponse {
        success: true,
        task_id: task.task_id().to_string(),
        status: task.status(),
        timeout: task.timeout(),
    }))
}

/// Polls once and, when the job is done, streams the result back.
async fn status_or_download(
    state: &AppState,
    kind: TaskKind,
    query: TaskQuery,
) -> Result<Response, ApiError> {
    let task_id = query.task_id.unwrap_or_default();
    orchestrator::validate_task_id(&task_id)?;
    let provider = state.provider()?;

    let task = RenderTask::resume(kind, task_id, Default::default());
    let task = orchestrator::poll_task(provider, task).await?;

    if task.status() == TaskStatus::Completed {
        let result = orchestrator::retrieve_result(provider, &task).await?;
        info!(task_id = %task.task_id(), kind = %kind, filename = %result.filename, "Serving job result");
        return Ok(result.into_response());
    }
    Ok(Json(TaskStatusResponse::from(&task)).into_response())
}

#[utoipa::path(
    post,
    path = "/download-visual",
    request_body = VisualRequest,
    responses(
        (status = 200, description = "Visual export job created", body = TaskCreatedResponse),
        (status = 400, description = "Missing viewId, bmType, geometry, pxSize or reference", body = ErrorBody),
        (status = 429, description = "Provider rate limit", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Create a visual export job"
)]
pub async fn create_visual(
    State(state): State<AppState>,
    Json(request): Json<VisualRequest>,
) -> Result<Json<TaskCreatedResponse>, ApiError> {
    create(&state, TaskKind::Visual, request.into()).await
}

#[utoipa::path(
    get,
    path = "/download-visual",
    params(TaskQuery),
    responses(
        (status = 200, description = "Job status, or the exported image once completed", body = TaskStatusResponse),
        (status = 400, description = "Missing or malformed taskId", body = ErrorBody),
        (status = 502, description = "Result could not be downloaded", body = ErrorBody)
    ),
    summary = "Poll a visual export job"
)]
pub async fn visual_status(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Response, ApiError> {
    status_or_download(&state, TaskKind::Visual, query).await
}

#[utoipa::path(
    post,
    path = "/download-bandmath",
    request_body = BandmathRequest,
    responses(
        (status = 200, description = "Band-math job created", body = TaskCreatedResponse),
        (status = 400, description = "Missing viewId, bmType, geometry or reference", body = ErrorBody),
        (status = 429, description = "Provider rate limit", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Create a band-math GeoTIFF job"
)]
pub async fn create_bandmath(
    State(state): State<AppState>,
    Json(request): Json<BandmathRequest>,
) -> Result<Json<TaskCreatedResponse>, ApiError> {
    create(&state, TaskKind::Bandmath, request.into()).await
}

#[utoipa::path(
    get,
    path = "/download-bandmath",
    params(TaskQuery),
    responses(
        (status = 200, description = "Job status, or the GeoTIFF once completed", body = TaskStatusResponse),
        (status = 400, description = "Missing or malformed taskId", body = ErrorBody),
        (status = 502, description = "Result could not be downloaded", body = ErrorBody)
    ),
    summary = "Poll a band-math job"
)]
pub async fn bandmath_status(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Response, ApiError> {
    status_or_download(&state, TaskKind::Bandmath, query).await
}
