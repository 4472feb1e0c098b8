use super::models::{
    CHLOROPHYLL_INDEX, CLUSTERING_PATH, ClusteringRequest, MOISTURE_INDEX, NDVI_INDEX,
    POINT_BOX_DELTA, PointAnalysisRequest, PointAnalysisResponse, PointParams, PointResponse,
};
use crate::common::{
    error::{ApiError, ErrorBody},
    state::AppState,
};
use crate::provider::ProviderClient;
use crate::routes::analysis::sources::fetch_scene_statistics;
use crate::routes::scenes::{
    models::{BoundingBox, GeometryQuery, SceneRecord, SearchArea},
    resolver,
};
use crate::routes::tiles::proxy::RENDER_PATH;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(point_value))
        .routes(routes!(point_analysis))
        .routes(routes!(clustering_options))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/point",
    params(PointParams),
    responses(
        (status = 200, description = "Index or band value at the point", body = PointResponse),
        (status = 400, description = "Missing or malformed lat, lon, viewId or band", body = ErrorBody),
        (status = 404, description = "Provider has no value at this point", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Index value at a coordinate for one view"
)]
pub async fn point_value(
    State(state): State<AppState>,
    Query(params): Query<PointParams>,
) -> Result<Json<PointResponse>, ApiError> {
    let query = params.parse()?;
    let provider = state.provider()?;

    let (lat, lon) = (query.lat.to_string(), query.lon.to_string());
    let mut segments: Vec<&str> = vec![query.sensor.as_str(), "point"];
    segments.extend(query.scene_path.iter().map(String::as_str));
    segments.extend([query.band.as_str(), lat.as_str(), lon.as_str()]);
    let url = provider.segment_url(RENDER_PATH, &segments)?;

    let data: Value = provider
        .send_json(provider.get_url(url).query(&[("CALIBRATE", "1")]))
        .await?;
    info!(sensor = %query.sensor, band = %query.band, lat = query.lat, lon = query.lon, "Point value read");
    Ok(Json(PointResponse {
        success: true,
        data,
    }))
}

/// Mean of `index` for the scene, or `None` when the provider has nothing.
async fn scene_mean(
    provider: &ProviderClient,
    index: &str,
    area: &SearchArea,
    scene: &SceneRecord,
) -> Option<f64> {
    match fetch_scene_statistics(provider, index, area, scene).await {
        Ok(stats) => stats.mean,
        Err(e) => {
            warn!(index, scene_id = %scene.id, kind = %e.kind(), error = %e, "Point statistics unavailable");
            None
        }
    }
}

#[utoipa::path(
    post,
    path = "/point-analysis",
    request_body = PointAnalysisRequest,
    responses(
        (status = 200, description = "NDVI, moisture and chlorophyll around the point; null where unavailable", body = PointAnalysisResponse),
        (status = 400, description = "coordinates missing or not a [lng, lat] pair", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Vegetation summary around a coordinate"
)]
pub async fn point_analysis(
    State(state): State<AppState>,
    Json(request): Json<PointAnalysisRequest>,
) -> Result<Json<PointAnalysisResponse>, ApiError> {
    let (lat, lon) = request.location()?;
    let provider = state.provider()?;

    let area = SearchArea::BoundingBox(BoundingBox::around(lat, lon, POINT_BOX_DELTA));
    let mut query = GeometryQuery::new(area.clone());
    query.max_cloud_coverage = state.config.max_cloud_coverage;
    let scenes = resolver::search(provider, &query).await?;

    let Some(scene) = resolver::select_best(&scenes) else {
        info!(lat, lon, "No recent scene around point");
        return Ok(Json(PointAnalysisResponse {
            success: true,
            timestamp: Some(Utc::now()),
            ..Default::default()
        }));
    };

    let (ndvi, soil_moisture, chlorophyll) = tokio::join!(
        scene_mean(provider, NDVI_INDEX, &area, scene),
        scene_mean(provider, MOISTURE_INDEX, &area, scene),
        scene_mean(provider, CHLOROPHYLL_INDEX, &area, scene),
    );
    info!(lat, lon, scene_id = %scene.id, ?ndvi, ?soil_moisture, ?chlorophyll, "Point analysed");

    Ok(Json(PointAnalysisResponse {
        success: true,
        scene_id: Some(scene.id.clone()),
        date: Some(scene.date),
        ndvi,
        soil_moisture,
        chlorophyll,
        timestamp: Some(Utc::now()),
    }))
}

#[utoipa::path(
    post,
    path = "/clustering",
    request_body = ClusteringRequest,
    responses(
        (status = 200, description = "Provider clustering options, passed through", body = Object),
        (status = 400, description = "view_id, geometry or params missing", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Clustering options for a view and geometry"
)]
pub async fn clustering_options(
    State(state): State<AppState>,
    Json(request): Json<ClusteringRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;
    let provider = state.provider()?;

    let body = json!({
        "view_id": request.view_id,
        "geometry": request.geometry,
        "params": request.params,
    });
    let options: Value = provider
        .send_json(provider.post_json(CLUSTERING_PATH, &body))
        .await?;
    Ok(Json(options))
}
