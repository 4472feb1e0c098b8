use crate::common::error::ApiError;
use chrono::{Duration, NaiveDate, Utc};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Parses `west,south,east,north`.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let parts = raw
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                ApiError::Validation(
                    "bbox must be: west,south,east,north (comma-separated numbers)".to_string(),
                )
            })?;
        let [west, south, east, north] = parts[..] else {
            return Err(ApiError::Validation(
                "bbox must contain exactly four numbers: west,south,east,north".to_string(),
            ));
        };
        let bbox = Self {
            west,
            south,
            east,
            north,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Square box of `delta` degrees around a point.
    pub fn around(lat: f64, lon: f64, delta: f64) -> Self {
        Self {
            west: lon - delta,
            south: lat - delta,
            east: lon + delta,
            north: lat + delta,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let values = [self.west, self.south, self.east, self.north];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ApiError::Validation("bbox values must be finite".to_string()));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(ApiError::Validation(
                "bbox longitudes must be within [-180, 180]".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(ApiError::Validation(
                "bbox latitudes must be within [-90, 90]".to_string(),
            ));
        }
        if self.west >= self.east || self.south >= self.north {
            return Err(ApiError::Validation(
                "bbox must satisfy west < east and south < north".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where to search: an axis-aligned box or an arbitrary polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchArea {
    BoundingBox(BoundingBox),
    Polygon(Polygon<f64>),
}

impl SearchArea {
    /// Accepts a GeoJSON `Polygon` geometry, or a `Feature` wrapping one.
    pub fn from_geojson(value: &Value) -> Result<Self, ApiError> {
        let geometry = match value.get("type").and_then(Value::as_str) {
            Some("Feature") => value.get("geometry").unwrap_or(&Value::Null),
            _ => value,
        };
        if geometry.get("type").and_then(Value::as_str) != Some("Polygon") {
            return Err(ApiError::Validation(
                "geometry must be a GeoJSON Polygon".to_string(),
            ));
        }
        let ring = geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .and_then(|rings| rings.first())
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Validation("polygon has no exterior ring".to_string()))?;

        let coords = ring
            .iter()
            .map(|point| {
                let pair = point.as_array()?;
                Some(Coord {
                    x: pair.first()?.as_f64()?,
                    y: pair.get(1)?.as_f64()?,
                })
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ApiError::Validation("polygon coordinates must be [lon, lat] pairs".to_string())
            })?;

        // Polygon::new closes the ring itself, so check what the caller sent
        if coords.len() < 4 || coords.first() != coords.last() {
            return Err(ApiError::Validation(
                "polygon exterior ring must be closed and have at least 4 points".to_string(),
            ));
        }
        let area = SearchArea::Polygon(Polygon::new(LineString::from(coords), vec![]));
        area.validate()?;
        Ok(area)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        match self {
            SearchArea::BoundingBox(bbox) => bbox.validate(),
            SearchArea::Polygon(polygon) => {
                let ring = polygon.exterior();
                if ring.0.len() < 4 || !ring.is_closed() {
                    return Err(ApiError::Validation(
                        "polygon exterior ring must be closed and have at least 4 points"
                            .to_string(),
                    ));
                }
                if ring.coords().any(|c| {
                    !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y)
                }) {
                    return Err(ApiError::Validation(
                        "polygon coordinates must be valid WGS84 lon/lat".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Exterior ring as `[[lon, lat], ...]`, first point repeated at the end.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        match self {
            SearchArea::BoundingBox(b) => vec![
                [b.west, b.north],
                [b.east, b.north],
                [b.east, b.south],
                [b.west, b.south],
                [b.west, b.north],
            ],
            SearchArea::Polygon(p) => p.exterior().coords().map(|c| [c.x, c.y]).collect(),
        }
    }

    pub fn to_geojson(&self) -> Value {
        json!({ "type": "Polygon", "coordinates": [self.ring()] })
    }

    /// Enclosing box of the area.
    pub fn bounds(&self) -> BoundingBox {
        match self {
            SearchArea::BoundingBox(b) => *b,
            SearchArea::Polygon(p) => {
                let mut bounds = BoundingBox {
                    west: f64::INFINITY,
                    south: f64::INFINITY,
                    east: f64::NEG_INFINITY,
                    north: f64::NEG_INFINITY,
                };
                for c in p.exterior().coords() {
                    bounds.west = bounds.west.min(c.x);
                    bounds.east = bounds.east.max(c.x);
                    bounds.south = bounds.south.min(c.y);
                    bounds.north = bounds.north.max(c.y);
                }
                bounds
            }
        }
    }
}

/// A validated scene search.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryQuery {
    pub area: SearchArea,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub max_cloud_coverage: f64,
    pub limit: u32,
}

impl GeometryQuery {
    /// Defaults: the last 30 days, 20 % cloud ceiling, 10 results.
    pub fn new(area: SearchArea) -> Self {
        let today = Utc::now().date_naive();
        Self {
            area,
            date_from: today - Duration::days(DEFAULT_LOOKBACK_DAYS),
            date_to: today,
            max_cloud_coverage: 20.0,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn from_params(params: &SearchParams, default_cloud: f64) -> Result<Self, ApiError> {
        let raw_bbox = params.bbox.as_deref().filter(|b| !b.trim().is_empty()).ok_or_else(|| {
            ApiError::Validation(
                "bbox required: provide west,south,east,north (e.g. 32.5,25.2,32.6,25.3)"
                    .to_string(),
            )
        })?;
        let mut query = Self::new(SearchArea::BoundingBox(BoundingBox::parse(raw_bbox)?));
        if let Some(from) = params.start_date.as_deref() {
            query.date_from = parse_date("startDate", from)?;
        }
        if let Some(to) = params.end_date.as_deref() {
            query.date_to = parse_date("endDate", to)?;
        }
        query.max_cloud_coverage = params.cloud_coverage.unwrap_or(default_cloud);
        query.limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.area.validate()?;
        if !(0.0..=100.0).contains(&self.max_cloud_coverage) {
            return Err(ApiError::Validation(
                "cloudCoverage must be between 0 and 100".to_string(),
            ));
        }
        if self.limit == 0 || self.limit > MAX_SEARCH_LIMIT {
            return Err(ApiError::Validation(format!(
                "limit must be between 1 and {MAX_SEARCH_LIMIT}"
            )));
        }
        if self.date_from > self.date_to {
            return Err(ApiError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}

/// Provider dates come as plain days or full timestamps; only the day matters.
pub fn parse_scene_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[derive(Deserialize, IntoParams, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// `west,south,east,north`
    pub bbox: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cloud_coverage: Option<f64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    pub id: String,
    pub view_id: String,
    pub date: NaiveDate,
    pub cloud_coverage: f64,
    pub platform: Option<String>,
    pub thumbnail: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub geometry: Option<Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cloud_coverage: f64,
    pub limit: u32,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub scenes: Vec<SceneRecord>,
    pub count: usize,
    pub bbox: BoundingBox,
    pub filters: SearchFilters,
}

/// Search answer as the provider sends it.
#[derive(Deserialize, Debug, Default)]
pub struct ProviderSearchResponse {
    #[serde(default)]
    pub results: Vec<ProviderScene>,
}

#[derive(Deserialize, Debug)]
pub struct ProviderScene {
    #[serde(rename = "sceneID")]
    pub scene_id: String,
    pub view_id: String,
    pub date: String,
    #[serde(rename = "cloudCoverage")]
    pub cloud_coverage: Option<f64>,
    pub platform: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(rename = "dataGeometry")]
    pub data_geometry: Option<Value>,
}
