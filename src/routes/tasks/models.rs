//! Render task model.
//!
//! A [`RenderTask`] mirrors one asynchronous job at the provider. The status
//! machine is:
//!
//! - `pending` / `processing`: still running, poll again later
//! - `completed`: always carries a `result_url`
//! - `failed`: carries an error message
//!
//! Only [`RenderTask::apply_update`] mutates status, result or error, and it
//! refuses to report `completed` without a result URL.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskKind {
    Bandmath,
    Visual,
    Zoning,
    Diff,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Normalises provider vocabulary. Unknown words mean the job is still
    /// running.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "finished" | "success" | "done" => TaskStatus::Completed,
            "failed" | "error" | "cancelled" | "canceled" => TaskStatus::Failed,
            "pending" | "created" | "queued" | "new" => TaskStatus::Pending,
            _ => TaskStatus::Processing,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
}

impl ImageFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Tiff => "image/tiff",
        }
    }
}

/// Everything a job can be created from. Which fields are required depends on
/// the [`TaskKind`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskParams {
    pub view_id: Option<String>,
    pub bm_type: Option<String>,
    pub geometry: Option<Value>,
    pub reference: Option<String>,
    pub name_alias: Option<String>,
    pub px_size: Option<f64>,
    pub format: Option<ImageFormat>,
    pub colormap: Option<String>,
    pub levels: Option<String>,
    pub calibrate: Option<u8>,
    pub field_id: Option<String>,
    pub vegetation_index: Option<String>,
    pub zone_quantity: Option<u8>,
    pub min_zone_area: Option<f64>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub comparison_view_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderTask {
    task_id: String,
    request_id: Option<String>,
    kind: TaskKind,
    #[serde(skip)]
    params: TaskParams,
    status: TaskStatus,
    timeout: Option<u64>,
    result_url: Option<String>,
    error: Option<String>,
    /// Raw provider status body for kinds whose result is inline (zoning).
    #[serde(skip)]
    payload: Option<Value>,
}

impl RenderTask {
    pub fn new(kind: TaskKind, task_id: impl Into<String>, params: TaskParams) -> Self {
        Self {
            task_id: task_id.into(),
            request_id: None,
            kind,
            params,
            status: TaskStatus::Pending,
            timeout: None,
            result_url: None,
            error: None,
            payload: None,
        }
    }

    /// Rebuilds a task from a caller-held id so it can be polled from a
    /// stateless request.
    pub fn resume(kind: TaskKind, task_id: impl Into<String>, params: TaskParams) -> Self {
        let mut task = Self::new(kind, task_id, params);
        task.status = TaskStatus::Processing;
        task
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn params(&self) -> &TaskParams {
        &self.params
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub(crate) fn set_request_meta(&mut self, request_id: Option<String>, timeout: Option<u64>) {
        self.request_id = request_id;
        self.timeout = timeout;
    }

    pub(crate) fn set_payload(&mut self, payload: Value) {
        self.payload = Some(payload);
    }

    /// Applies one provider status report. A completion without a result URL
    /// is held in `processing`; terminal tasks are left untouched.
    pub(crate) fn apply_update(
        &mut self,
        raw_status: &str,
        result_url: Option<String>,
        error: Option<String>,
    ) {
        if self.status.is_terminal() {
            return;
        }
        let result_url = result_url.filter(|u| !u.trim().is_empty());
        match TaskStatus::from_provider(raw_status) {
            TaskStatus::Completed => match result_url {
                Some(url) => {
                    self.status = TaskStatus::Completed;
                    self.result_url = Some(url);
                }
                None => self.status = TaskStatus::Processing,
            },
            TaskStatus::Failed => {
                self.status = TaskStatus::Failed;
                self.error = Some(error.unwrap_or_else(|| "task failed at provider".to_string()));
            }
            other => self.status = other,
        }
    }
}

/// Job creation answer from the provider.
#[derive(Deserialize, Debug, Default)]
pub struct ProviderTaskCreated {
    pub task_id: Option<String>,
    pub req_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub task_timeout: Option<u64>,
    #[serde(alias = "url")]
    pub result_url: Option<String>,
    pub error: Option<String>,
}

/// Job status answer from the provider.
#[derive(Deserialize, Debug, Default)]
pub struct ProviderTaskStatus {
    #[serde(default)]
    pub status: String,
    #[serde(alias = "url")]
    pub result_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BandmathRequest {
    pub view_id: Option<String>,
    pub bm_type: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub geometry: Option<Value>,
    pub name_alias: Option<String>,
    pub reference: Option<String>,
}

impl From<BandmathRequest> for TaskParams {
    fn from(req: BandmathRequest) -> Self {
        TaskParams {
            view_id: req.view_id,
            bm_type: req.bm_type,
            geometry: req.geometry,
            name_alias: req.name_alias,
            reference: req.reference,
            ..Default::default()
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisualRequest {
    pub view_id: Option<String>,
    pub bm_type: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub geometry: Option<Value>,
    pub px_size: Option<f64>,
    pub format: Option<ImageFormat>,
    pub colormap: Option<String>,
    pub levels: Option<String>,
    pub calibrate: Option<u8>,
    pub reference: Option<String>,
}

impl From<VisualRequest> for TaskParams {
    fn from(req: VisualRequest) -> Self {
        TaskParams {
            view_id: req.view_id,
            bm_type: req.bm_type,
            geometry: req.geometry,
            px_size: req.px_size,
            format: req.format,
            colormap: req.colormap,
            levels: req.levels,
            calibrate: req.calibrate,
            reference: req.reference,
            ..Default::default()
        }
    }
}

#[derive(Deserialize, IntoParams, Debug)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    pub task_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreatedResponse {
    pub success: bool,
    pub task_id: String,
    pub status: TaskStatus,
    pub timeout: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub success: bool,
    pub status: TaskStatus,
    pub task_id: String,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

impl From<&RenderTask> for TaskStatusResponse {
    fn from(task: &RenderTask) -> Self {
        Self {
            success: true,
            status: task.status(),
            task_id: task.task_id().to_string(),
            result_url: task.result_url().map(str::to_string),
            error: task.error().map(str::to_string),
        }
    }
}
