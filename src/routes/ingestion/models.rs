use crate::common::error::{ApiError, ErrorKind};
use crate::routes::tasks::models::TaskStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Scheduled satellite refresh looks back this many days.
pub const REFRESH_LOOKBACK_DAYS: i64 = 7;
/// Scenes read per field and run.
pub const REFRESH_SCENE_LIMIT: u32 = 3;
/// Index recorded by the scheduled refresh.
pub const REFRESH_INDEX: &str = "NDVI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Error,
}

/// Failure of one item; the run carries on with the next one.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ApiError> for ItemError {
    fn from(err: &ApiError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub field_id: Uuid,
    pub status: ItemStatus,
    pub readings: u64,
    pub error: Option<ItemError>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub fields_processed: usize,
    pub total_readings: u64,
    pub results: Vec<FieldResult>,
}

impl RefreshReport {
    pub fn new(results: Vec<FieldResult>) -> Self {
        Self {
            success: true,
            timestamp: Utc::now(),
            fields_processed: results.len(),
            total_readings: results.iter().map(|r| r.readings).sum(),
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmResult {
    pub farm_id: Uuid,
    pub status: ItemStatus,
    pub days: u64,
    pub error: Option<ItemError>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapResult {
    pub map_id: Uuid,
    pub status: ItemStatus,
    /// Job state after this run's poll
    pub map_status: Option<TaskStatus>,
    pub error: Option<ItemError>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub farms_processed: usize,
    pub weather_days: u64,
    pub maps_checked: usize,
    pub farms: Vec<FarmResult>,
    pub maps: Vec<MapResult>,
}

impl AnalyticsReport {
    pub fn new(farms: Vec<FarmResult>, maps: Vec<MapResult>) -> Self {
        Self {
            success: true,
            timestamp: Utc::now(),
            farms_processed: farms.len(),
            weather_days: farms.iter().map(|f| f.days).sum(),
            maps_checked: maps.len(),
            farms,
            maps,
        }
    }
}
