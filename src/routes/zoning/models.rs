use crate::routes::analysis::models::Zone;
use crate::routes::tasks::models::{TaskParams, TaskStatus};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_ZONE_QUANTITY: u8 = 5;
/// Square metres
pub const DEFAULT_MIN_ZONE_AREA: f64 = 1000.0;

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoningRequest {
    pub field_id: Option<String>,
    /// NDVI when omitted
    pub vegetation_index: Option<String>,
    /// 3, 5 or 7; 5 when omitted
    pub zone_quantity: Option<u8>,
    pub min_zone_area: Option<f64>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

impl From<CreateZoningRequest> for TaskParams {
    fn from(req: CreateZoningRequest) -> Self {
        TaskParams {
            field_id: req.field_id,
            vegetation_index: Some(
                req.vegetation_index
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| "NDVI".to_string()),
            ),
            zone_quantity: Some(req.zone_quantity.unwrap_or(DEFAULT_ZONE_QUANTITY)),
            min_zone_area: Some(req.min_zone_area.unwrap_or(DEFAULT_MIN_ZONE_AREA)),
            date_start: req.date_start,
            date_end: req.date_end,
            ..Default::default()
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoningResponse {
    pub success: bool,
    pub zmap_id: String,
    pub task_id: String,
    pub productivity_map_id: Uuid,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ZoningStatusResponse {
    pub success: bool,
    pub status: TaskStatus,
    pub zones: Option<Vec<Zone>>,
    pub shapefile_url: Option<String>,
    pub error: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
}
