use crate::routes::analysis::models::ChangeAnalysis;
use crate::routes::tasks::models::TaskParams;
use crate::routes::tiles::styling::Legend;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const DEFAULT_INDEX: &str = "NDVI";
pub const ALERT_STATUS_UNREAD: &str = "unread";

fn index_or_default(index: Option<String>) -> String {
    index
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_INDEX.to_string())
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct DiffRequest {
    /// Baseline (older) view
    #[serde(rename = "viewId1")]
    pub view_id_1: Option<String>,
    /// Comparison (newer) view
    #[serde(rename = "viewId2")]
    pub view_id_2: Option<String>,
    pub index: Option<String>,
}

impl From<DiffRequest> for TaskParams {
    fn from(req: DiffRequest) -> Self {
        TaskParams {
            view_id: req.view_id_1,
            comparison_view_id: req.view_id_2,
            vegetation_index: Some(index_or_default(req.index)),
            ..Default::default()
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub success: bool,
    /// Relative `{z}/{x}/{y}` template served by this API
    pub tile_url: String,
    pub legend: Legend,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub field_id: Option<String>,
    /// Baseline day, YYYY-MM-DD
    pub date1: Option<String>,
    /// Comparison day, YYYY-MM-DD
    pub date2: Option<String>,
    pub index: Option<String>,
    /// Store an alert when the change is significant
    #[serde(default)]
    pub create_alert: bool,
}

impl AnalyzeRequest {
    pub fn index(&self) -> String {
        index_or_default(self.index.clone())
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub analysis: ChangeAnalysis,
    pub alert_id: Option<Uuid>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct DiffTileParams {
    #[serde(rename = "viewId1")]
    #[param(rename = "viewId1")]
    pub view_id_1: Option<String>,
    #[serde(rename = "viewId2")]
    #[param(rename = "viewId2")]
    pub view_id_2: Option<String>,
    pub index: Option<String>,
}

impl DiffTileParams {
    pub fn index(&self) -> String {
        index_or_default(self.index.clone())
    }
}
