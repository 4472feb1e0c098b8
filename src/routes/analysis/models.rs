use crate::common::error::ApiError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// One hourly weather observation as the provider sends it. Kept verbatim in
/// the day aggregate's snapshot array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Per farm and UTC calendar day. Means are taken per metric over the
/// snapshots that carry that metric.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDayAggregate {
    pub farm_id: Uuid,
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation: Option<f64>,
    pub condition: Option<String>,
    pub snapshots: Vec<WeatherSnapshot>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductivityLevel {
    Low,
    Medium,
    High,
}

impl ProductivityLevel {
    /// Zone 1 is the weakest, zones 4 and up are the strongest.
    pub fn from_zone_number(zone: u32) -> Self {
        match zone {
            1 => ProductivityLevel::Low,
            n if n >= 4 => ProductivityLevel::High,
            _ => ProductivityLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Zone {
    pub zone_id: String,
    /// Square metres
    pub area: f64,
    pub area_percent: f64,
    pub productivity_level: ProductivityLevel,
    pub fertilizer_recommendation: Option<Value>,
    pub geometry: Option<Value>,
}

/// Summary statistics of one vegetation index over one area and period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IndexStatistics {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default, alias = "stddev", alias = "std")]
    pub std_dev: Option<f64>,
}

/// Results of a finished analysis task, ready to be folded into a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Zones(Vec<Zone>),
    Statistics(IndexStatistics),
}

/// One persisted reading for (field, scene, index).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSnapshot {
    pub field_id: Uuid,
    pub scene_id: String,
    pub index_type: String,
    pub statistics: IndexStatistics,
    pub cloud_coverage: Option<f64>,
    pub captured_at: DateTime<Utc>,
    pub zones: Option<Vec<Zone>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeType {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ChangeStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl From<&IndexStatistics> for ChangeStats {
    fn from(stats: &IndexStatistics) -> Self {
        Self {
            mean: stats.mean.unwrap_or(0.0),
            min: stats.min.unwrap_or(0.0),
            max: stats.max.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAnalysis {
    pub change_percentage: f64,
    pub baseline_stats: ChangeStats,
    pub comparison_stats: ChangeStats,
    pub change_type: ChangeType,
    pub is_significant: bool,
}

/// Index names end up in provider URL paths.
pub fn validate_index(index: &str) -> Result<(), ApiError> {
    if !index.is_empty() && index.len() <= 16 && index.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "unsupported vegetation index '{index}'"
        )))
    }
}

#[derive(Deserialize)]
pub(crate) struct ProviderStatisticsResponse {
    pub data: ProviderStatisticsData,
}

#[derive(Deserialize)]
pub(crate) struct ProviderStatisticsData {
    #[serde(default)]
    pub statistics: IndexStatistics,
}

#[derive(Deserialize)]
pub(crate) struct ProviderWeatherResponse {
    #[serde(default)]
    pub data: Vec<WeatherSnapshot>,
}
