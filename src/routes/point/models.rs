use crate::common::error::ApiError;
use crate::routes::analysis::models::validate_index;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_BAND: &str = "NDVI";
pub const CLUSTERING_PATH: &str = "/api/render/clustering_options";
/// Half-width in degrees of the box analysed around a point (about 500 m).
pub const POINT_BOX_DELTA: f64 = 0.005;
pub const NDVI_INDEX: &str = "NDVI";
pub const MOISTURE_INDEX: &str = "NDMI";
pub const CHLOROPHYLL_INDEX: &str = "CCCI";

fn parse_coordinate(name: &str, raw: &str, limit: f64) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && (-limit..=limit).contains(v))
        .ok_or_else(|| {
            ApiError::Validation(format!("{name} must be a number within [-{limit}, {limit}]"))
        })
}

fn is_path_safe(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PointParams {
    /// Latitude, WGS84
    pub lat: Option<String>,
    /// Longitude, WGS84
    pub lon: Option<String>,
    /// View id such as `S2/36/R/VU/2025/6/4/0`
    pub view_id: Option<String>,
    /// Index or band name, NDVI when absent
    pub band: Option<String>,
}

/// Validated point request. The view id is split into the sensor and the
/// scene path the provider expects.
#[derive(Debug, Clone, PartialEq)]
pub struct PointQuery {
    pub sensor: String,
    pub scene_path: Vec<String>,
    pub band: String,
    pub lat: f64,
    pub lon: f64,
}

impl PointParams {
    pub fn parse(&self) -> Result<PointQuery, ApiError> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let (Some(lat), Some(lon), Some(view_id)) = (
            non_blank(&self.lat),
            non_blank(&self.lon),
            non_blank(&self.view_id),
        ) else {
            return Err(ApiError::Validation(
                "Missing required parameters: lat, lon, viewId".to_string(),
            ));
        };
        let lat = parse_coordinate("lat", &lat, 90.0)?;
        let lon = parse_coordinate("lon", &lon, 180.0)?;

        let mut parts = view_id.split('/').map(str::to_string);
        let sensor = parts.next().unwrap_or_default();
        let scene_path: Vec<String> = parts.collect();
        if !is_path_safe(&sensor)
            || scene_path.is_empty()
            || !scene_path.iter().all(|s| is_path_safe(s))
        {
            return Err(ApiError::Validation(format!(
                "viewId '{view_id}' must look like SENSOR/scene/path"
            )));
        }

        let band = non_blank(&self.band).unwrap_or_else(|| DEFAULT_BAND.to_string());
        validate_index(&band)?;
        Ok(PointQuery {
            sensor,
            scene_path,
            band,
            lat,
            lon,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct PointResponse {
    pub success: bool,
    /// Provider answer as received
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct PointAnalysisRequest {
    /// `[longitude, latitude]`
    pub coordinates: Option<Vec<f64>>,
}

impl PointAnalysisRequest {
    /// `(lat, lon)` from the `[lng, lat]` pair.
    pub fn location(&self) -> Result<(f64, f64), ApiError> {
        let invalid = || ApiError::Validation("Invalid coordinates. Expected [lng, lat]".to_string());
        let [lon, lat] = self.coordinates.as_deref().ok_or_else(invalid)? else {
            return Err(invalid());
        };
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(invalid());
        }
        Ok((*lat, *lon))
    }
}

#[derive(Serialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PointAnalysisResponse {
    pub success: bool,
    /// Scene the values were read from; null when none was found
    pub scene_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub ndvi: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub chlorophyll: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct ClusteringRequest {
    pub view_id: Option<String>,
    #[schema(value_type = Object)]
    pub geometry: Option<Value>,
    /// Clustering settings, forwarded unchanged
    #[schema(value_type = Object)]
    pub params: Option<Value>,
}

impl ClusteringRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut missing = Vec::new();
        if self.view_id.as_deref().is_none_or(|v| v.trim().is_empty()) {
            missing.push("view_id");
        }
        if self.geometry.as_ref().is_none_or(Value::is_null) {
            missing.push("geometry");
        }
        if self.params.as_ref().is_none_or(Value::is_null) {
            missing.push("params");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )))
        }
    }
}
