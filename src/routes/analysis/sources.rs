//! Provider reads feeding the aggregator: index statistics and hourly weather.

use super::models::{
    IndexStatistics, ProviderStatisticsResponse, ProviderWeatherResponse, WeatherSnapshot,
    validate_index,
};
use crate::common::error::ApiError;
use crate::provider::ProviderClient;
use crate::routes::scenes::models::{SceneRecord, SearchArea};
use serde_json::json;
use tracing::debug;

pub const STATISTICS_PATH: &str = "/v1/statistics";
pub const WEATHER_PATH: &str = "/v1/weather";
/// Scheduled ingestion reads the last day of hourly observations.
pub const WEATHER_WINDOW_HOURS: u32 = 24;

/// Index statistics over `area` for one resolved scene.
pub async fn fetch_scene_statistics(
    provider: &ProviderClient,
    index: &str,
    area: &SearchArea,
    scene: &SceneRecord,
) -> Result<IndexStatistics, ApiError> {
    validate_index(index)?;
    let body = json!({
        "geometry": area.to_geojson(),
        "datetime": format!("{0}/{0}", scene.date),
        "view_id": scene.view_id,
    });
    let response: ProviderStatisticsResponse = provider
        .send_json(provider.post_json(&format!("{STATISTICS_PATH}/{index}"), &body))
        .await?;
    debug!(
        index,
        scene_id = %scene.id,
        date = %scene.date,
        mean = ?response.data.statistics.mean,
        "Statistics fetched"
    );
    Ok(response.data.statistics)
}

pub async fn fetch_weather(
    provider: &ProviderClient,
    latitude: f64,
    longitude: f64,
    hours: u32,
) -> Result<Vec<WeatherSnapshot>, ApiError> {
    let request = provider.get(WEATHER_PATH).query(&[
        ("lat", latitude.to_string()),
        ("lon", longitude.to_string()),
        ("hours", hours.to_string()),
    ]);
    let response: ProviderWeatherResponse = provider.send_json(request).await?;
    debug!(latitude, longitude, samples = response.data.len(), "Weather fetched");
    Ok(response.data)
}
