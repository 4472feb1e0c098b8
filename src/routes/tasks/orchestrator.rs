//! Create, poll and retrieve provider jobs.
//!
//! Handlers never wait for a job to finish. A create call returns as soon as
//! the provider accepts the job; every poll is exactly one status request; the
//! result is fetched with one more GET once the job reports completion.
//! [`TaskPoller`] is the caller-side loop for code that does want to wait.

use super::models::{
    ImageFormat, ProviderTaskCreated, ProviderTaskStatus, RenderTask, TaskKind, TaskParams,
    TaskStatus,
};
use crate::common::error::{ApiError, ErrorKind};
use crate::config::Config;
use crate::provider::ProviderClient;
use crate::routes::tiles::proxy::diff_tile_template;
use axum::{
    body::Bytes,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio_retry::{RetryIf, strategy::FixedInterval};
use tracing::{debug, info, warn};

pub const GDW_PATH: &str = "/api/gdw/api";
pub const ZONING_CREATE_PATH: &str = "/v1/zoning/vegetation-map";
pub const ZONING_MAPS_PATH: &str = "/v1/zoning/maps";
pub const ZONE_QUANTITIES: [u8; 3] = [3, 5, 7];

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Checks the per-kind required inputs. Runs before any network call.
pub fn validate(kind: TaskKind, params: &TaskParams) -> Result<(), ApiError> {
    let mut missing: Vec<&str> = Vec::new();
    match kind {
        TaskKind::Bandmath | TaskKind::Visual => {
            if is_blank(&params.view_id) {
                missing.push("viewId");
            }
            if is_blank(&params.bm_type) {
                missing.push("bmType");
            }
            if params.geometry.as_ref().is_none_or(Value::is_null) {
                missing.push("geometry");
            }
            if kind == TaskKind::Visual && params.px_size.is_none() {
                missing.push("pxSize");
            }
            if is_blank(&params.reference) {
                missing.push("reference");
            }
        }
        TaskKind::Zoning => {
            if is_blank(&params.field_id) {
                missing.push("fieldId");
            }
        }
        TaskKind::Diff => {
            if is_blank(&params.view_id) {
                missing.push("viewId1");
            }
            if is_blank(&params.comparison_view_id) {
                missing.push("viewId2");
            }
        }
    }
    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "Missing required parameters: {}",
            missing.join(", ")
        )));
    }

    if let Some(px) = params.px_size
        && (!px.is_finite() || px <= 0.0)
    {
        return Err(ApiError::Validation(
            "pxSize must be a positive number".to_string(),
        ));
    }
    if kind == TaskKind::Zoning
        && let Some(quantity) = params.zone_quantity
        && !ZONE_QUANTITIES.contains(&quantity)
    {
        return Err(ApiError::Validation(
            "zoneQuantity must be one of 3, 5 or 7".to_string(),
        ));
    }
    Ok(())
}

/// Job inputs that passed [`validate`]. The only way into [`create_task`].
#[derive(Debug, Clone)]
pub struct TaskRequest {
    kind: TaskKind,
    params: TaskParams,
}

impl TaskRequest {
    pub fn new(kind: TaskKind, params: TaskParams) -> Result<Self, ApiError> {
        validate(kind, &params)?;
        Ok(Self { kind, params })
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn params(&self) -> &TaskParams {
        &self.params
    }
}

/// Task ids end up in provider URL paths.
pub fn validate_task_id(task_id: &str) -> Result<(), ApiError> {
    let valid = !task_id.is_empty()
        && task_id.len() <= 128
        && task_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation("taskId is missing or malformed".to_string()))
    }
}

fn insert_opt<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.into());
    }
}

/// Provider body for a job creation request.
pub fn build_create_body(kind: TaskKind, params: &TaskParams) -> Value {
    match kind {
        TaskKind::Bandmath => {
            let mut inner = Map::new();
            insert_opt(&mut inner, "view_id", params.view_id.clone());
            insert_opt(&mut inner, "bm_type", params.bm_type.clone());
            insert_opt(&mut inner, "geometry", params.geometry.clone());
            insert_opt(&mut inner, "name_alias", params.name_alias.clone());
            insert_opt(&mut inner, "reference", params.reference.clone());
            json!({ "type": "bandmath", "params": inner })
        }
        TaskKind::Visual => {
            let format = params.format.unwrap_or_default();
            let mut inner = Map::new();
            insert_opt(&mut inner, "view_id", params.view_id.clone());
            insert_opt(&mut inner, "bm_type", params.bm_type.clone());
            insert_opt(&mut inner, "geometry", params.geometry.clone());
            insert_opt(&mut inner, "px_size", params.px_size);
            inner.insert("format".to_string(), format.as_ref().into());
            insert_opt(&mut inner, "reference", params.reference.clone());
            inner.insert("calibrate".to_string(), params.calibrate.unwrap_or(1).into());
            insert_opt(&mut inner, "colormap", params.colormap.clone());
            insert_opt(&mut inner, "levels", params.levels.clone());
            json!({ "type": format.as_ref(), "params": inner })
        }
        TaskKind::Zoning => {
            let mut body = Map::new();
            insert_opt(&mut body, "field_id", params.field_id.clone());
            body.insert(
                "vegetation_index".to_string(),
                params
                    .vegetation_index
                    .clone()
                    .unwrap_or_else(|| "NDVI".to_string())
                    .into(),
            );
            body.insert(
                "zone_quantity".to_string(),
                params.zone_quantity.unwrap_or(5).into(),
            );
            insert_opt(&mut body, "min_zone_area", params.min_zone_area);
            insert_opt(&mut body, "date_start", params.date_start.clone());
            insert_opt(&mut body, "date_end", params.date_end.clone());
            Value::Object(body)
        }
        TaskKind::Diff => json!({
            "scene1": params.view_id,
            "scene2": params.comparison_view_id,
            "index": params.vegetation_index,
        }),
    }
}

/// Creates a job at the provider. Diff "jobs" are resolved locally into an
/// already completed task pointing at the proxied diff tile template.
pub async fn create_task(
    provider: &ProviderClient,
    request: TaskRequest,
) -> Result<RenderTask, ApiError> {
    let TaskRequest { kind, params } = request;
    match kind {
        TaskKind::Diff => {
            let index = params
                .vegetation_index
                .clone()
                .unwrap_or_else(|| "NDVI".to_string());
            let template = diff_tile_template(
                params.view_id.as_deref().unwrap_or_default(),
                params.comparison_view_id.as_deref().unwrap_or_default(),
                &index,
            );
            let task_id = format!("diff-{}", uuid::Uuid::new_v4());
            let mut task = RenderTask::new(kind, task_id, params);
            task.apply_update("completed", Some(template), None);
            Ok(task)
        }
        TaskKind::Zoning => {
            let body = build_create_body(kind, &params);
            let created: Value = provider
                .send_json(provider.post_json(ZONING_CREATE_PATH, &body))
                .await?;
            let zmap_id = created
                .get("zmap_id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| missing_id("zmap_id"))?
                .to_string();
            let provider_task = created
                .get("task_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(zmap_id.clone()));

            let mut task = RenderTask::new(kind, zmap_id, params);
            task.set_request_meta(provider_task, None);
            task.apply_update("processing", None, None);
            info!(task_id = %task.task_id(), kind = %kind, "Zoning job created");
            Ok(task)
        }
        TaskKind::Bandmath | TaskKind::Visual => {
            let body = build_create_body(kind, &params);
            let created: ProviderTaskCreated = provider
                .send_json(provider.post_json(GDW_PATH, &body))
                .await?;
            let task_id = created
                .task_id
                .filter(|s| !s.is_empty())
                .ok_or_else(|| missing_id("task_id"))?;

            let mut task = RenderTask::new(kind, task_id, params);
            task.set_request_meta(created.req_id, created.task_timeout);
            task.apply_update(
                created.status.as_deref().unwrap_or("pending"),
                created.result_url,
                created.error,
            );
            info!(
                task_id = %task.task_id(),
                kind = %kind,
                status = %task.status(),
                timeout = ?task.timeout(),
                "Render job created"
            );
            Ok(task)
        }
    }
}

fn missing_id(field: &str) -> ApiError {
    ApiError::Upstream {
        status: 502,
        body: format!("provider response did not include {field}"),
    }
}

/// One status request. Terminal tasks come back unchanged without touching
/// the network.
pub async fn poll_task(
    provider: &ProviderClient,
    mut task: RenderTask,
) -> Result<RenderTask, ApiError> {
    if task.status().is_terminal() {
        debug!(task_id = %task.task_id(), status = %task.status(), "Task already terminal");
        return Ok(task);
    }
    validate_task_id(task.task_id())?;

    match task.kind() {
        TaskKind::Bandmath | TaskKind::Visual => {
            let url = provider.segment_url(GDW_PATH, &[task.task_id()])?;
            let status: ProviderTaskStatus =
                provider.send_json(provider.get_url(url)).await?;
            task.apply_update(&status.status, status.result_url, status.error);
        }
        TaskKind::Zoning => {
            let field_id = task
                .params()
                .field_id
                .clone()
                .ok_or_else(|| ApiError::Validation("zoning task has no field id".to_string()))?;
            let url = provider.segment_url(ZONING_MAPS_PATH, &[&field_id, task.task_id()])?;
            let body: Value = provider.send_json(provider.get_url(url.clone())).await?;
            let raw_status = body
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("processing")
                .to_string();
            // Zone data is delivered inline; the shapefile is the downloadable part
            let result_url = body
                .get("shapefile_download_url")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(url.to_string()));
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .or_else(|| body.pointer("/errors/0/message").and_then(Value::as_str))
                .map(str::to_string);
            task.apply_update(&raw_status, result_url, error);
            task.set_payload(body);
        }
        TaskKind::Diff => {}
    }

    debug!(
        task_id = %task.task_id(),
        kind = %task.kind(),
        status = %task.status(),
        "Task polled"
    );
    Ok(task)
}

/// Downloaded job output, ready to be sent as an attachment.
#[derive(Debug)]
pub struct TaskResult {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
}

impl IntoResponse for TaskResult {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.content_type),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
                (
                    header::CACHE_CONTROL,
                    "public, max-age=31536000, immutable".to_string(),
                ),
            ],
            self.bytes,
        )
            .into_response()
    }
}

fn default_content_type(task: &RenderTask) -> &'static str {
    match task.kind() {
        TaskKind::Bandmath => ImageFormat::Tiff.content_type(),
        _ => task.params().format.unwrap_or_default().content_type(),
    }
}

fn result_filename(task: &RenderTask, content_type: &str) -> String {
    match task.kind() {
        TaskKind::Bandmath => format!("bandmath-{}.tif", task.task_id()),
        _ => {
            let ext = content_type
                .split(';')
                .next()
                .and_then(|mime| mime.split('/').nth(1))
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .unwrap_or("png");
            format!("satellite-image-{}.{ext}", task.task_id())
        }
    }
}

/// Fetches the output of a completed band-math or visual job. Never retried.
pub async fn retrieve_result(
    provider: &ProviderClient,
    task: &RenderTask,
) -> Result<TaskResult, ApiError> {
    if !matches!(task.kind(), TaskKind::Bandmath | TaskKind::Visual) {
        return Err(ApiError::Validation(format!(
            "{} tasks have no downloadable result",
            task.kind()
        )));
    }
    let url = match (task.status(), task.result_url()) {
        (TaskStatus::Completed, Some(url)) => url,
        _ => {
            return Err(ApiError::Validation(format!(
                "task {} is not completed",
                task.task_id()
            )));
        }
    };

    let response = provider
        .get_absolute(url)
        .send()
        .await
        .map_err(|e| ApiError::Retrieval(format!("failed to download result: {e}")))?;
    if !response.status().is_success() {
        warn!(
            task_id = %task.task_id(),
            status = response.status().as_u16(),
            "Result download rejected"
        );
        return Err(ApiError::Retrieval(format!(
            "failed to download result: provider returned {}",
            response.status().as_u16()
        )));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(default_content_type(task))
        .to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Retrieval(format!("failed to read result body: {e}")))?;

    info!(
        task_id = %task.task_id(),
        bytes = bytes.len(),
        content_type = %content_type,
        "Result retrieved"
    );
    Ok(TaskResult {
        filename: result_filename(task, &content_type),
        content_type,
        bytes,
    })
}

enum PollAttempt {
    Pending,
    Failed(ApiError),
}

/// Caller-side polling: one status request per tick until the task is
/// terminal or the attempts run out.
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    interval: Duration,
    max_attempts: usize,
}

impl TaskPoller {
    pub fn new(interval: Duration, max_attempts: usize) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs),
            config.poll_max_attempts,
        )
    }

    pub async fn run(
        &self,
        provider: &ProviderClient,
        task: RenderTask,
    ) -> Result<RenderTask, ApiError> {
        if task.status().is_terminal() {
            return Ok(task);
        }
        let task_id = task.task_id().to_string();
        let strategy = FixedInterval::new(self.interval).take(self.max_attempts - 1);

        let outcome = RetryIf::spawn(
            strategy,
            || {
                let task = task.clone();
                async move {
                    match poll_task(provider, task).await {
                        Ok(polled) if polled.status().is_terminal() => Ok(polled),
                        Ok(_) => Err(PollAttempt::Pending),
                        Err(e) => Err(PollAttempt::Failed(e)),
                    }
                }
            },
            |attempt: &PollAttempt| match attempt {
                PollAttempt::Pending => true,
                PollAttempt::Failed(e) => e.kind() == ErrorKind::Transient,
            },
        )
        .await;

        match outcome {
            Ok(done) => Ok(done),
            Err(PollAttempt::Pending) => {
                warn!(task_id = %task_id, attempts = self.max_attempts, "Polling timed out");
                Err(ApiError::Transient("polling timed out".to_string()))
            }
            Err(PollAttempt::Failed(e)) => Err(e),
        }
    }
}

impl Default for TaskPoller {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 60)
    }
}
