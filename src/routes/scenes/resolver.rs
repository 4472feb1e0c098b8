//! Scene resolution: one provider search, then deterministic ranking.
//!
//! Ranking prefers the clearest scene (lowest cloud coverage) and breaks ties
//! with the most recent capture date, so the same candidate set always yields
//! the same choice.

use super::models::{
    GeometryQuery, ProviderScene, ProviderSearchResponse, SceneRecord, parse_scene_date,
};
use crate::common::error::ApiError;
use crate::provider::ProviderClient;
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::cmp::Ordering;
use tracing::{debug, info};

pub const SEARCH_PATH: &str = "/api/lms/search/v2/sentinel2";

const SEARCH_FIELDS: [&str; 7] = [
    "sceneID",
    "cloudCoverage",
    "date",
    "view_id",
    "dataGeometry",
    "platform",
    "thumbnail",
];

pub fn build_search_body(query: &GeometryQuery) -> Value {
    json!({
        "fields": SEARCH_FIELDS,
        "limit": query.limit,
        "page": 1,
        "search": {
            "date": {
                "from": query.date_from.format("%Y-%m-%d").to_string(),
                "to": query.date_to.format("%Y-%m-%d").to_string(),
            },
            "cloudCoverage": { "from": 0, "to": query.max_cloud_coverage },
            "shapeRelation": "INTERSECTS",
            "shape": query.area.to_geojson(),
        },
        "sort": { "date": "desc" },
    })
}

fn to_record(scene: ProviderScene) -> Option<SceneRecord> {
    let Some(date) = parse_scene_date(&scene.date) else {
        debug!(scene_id = %scene.scene_id, date = %scene.date, "Skipping scene with unreadable date");
        return None;
    };
    let Some(cloud_coverage) = scene.cloud_coverage else {
        debug!(scene_id = %scene.scene_id, "Skipping scene without cloud coverage");
        return None;
    };
    Some(SceneRecord {
        id: scene.scene_id,
        view_id: scene.view_id,
        date,
        cloud_coverage,
        platform: scene.platform,
        thumbnail: scene.thumbnail,
        geometry: scene.data_geometry,
    })
}

/// Cloud coverage ascending, then date descending.
pub fn compare(a: &SceneRecord, b: &SceneRecord) -> Ordering {
    a.cloud_coverage
        .total_cmp(&b.cloud_coverage)
        .then_with(|| b.date.cmp(&a.date))
}

pub fn rank(scenes: &mut [SceneRecord]) {
    scenes.sort_by(compare);
}

pub fn select_best(scenes: &[SceneRecord]) -> Option<&SceneRecord> {
    scenes.iter().min_by(|a, b| compare(a, b))
}

/// Best scene captured on exactly `date`.
pub fn best_on_date(scenes: &[SceneRecord], date: NaiveDate) -> Result<SceneRecord, ApiError> {
    let on_day: Vec<SceneRecord> = scenes.iter().filter(|s| s.date == date).cloned().collect();
    select_best(&on_day)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("no scene available for {date}")))
}

/// Runs one search and returns the candidates ranked best first. Scenes the
/// provider returns above the cloud ceiling are dropped, and the list is cut
/// to the requested limit.
pub async fn search(
    provider: &ProviderClient,
    query: &GeometryQuery,
) -> Result<Vec<SceneRecord>, ApiError> {
    query.validate()?;
    let body = build_search_body(query);
    let response: ProviderSearchResponse = provider
        .send_json(provider.post_json(SEARCH_PATH, &body))
        .await?;

    let returned = response.results.len();
    let mut scenes: Vec<SceneRecord> = response
        .results
        .into_iter()
        .filter_map(to_record)
        .filter(|s| s.cloud_coverage <= query.max_cloud_coverage)
        .collect();
    rank(&mut scenes);
    scenes.truncate(query.limit as usize);

    info!(
        returned,
        kept = scenes.len(),
        from = %query.date_from,
        to = %query.date_to,
        max_cloud = query.max_cloud_coverage,
        "Scene search complete"
    );
    Ok(scenes)
}
