use super::models::{GeometryQuery, SearchFilters, SearchParams, SearchResponse};
use super::resolver;
use crate::common::{
    error::{ApiError, ErrorBody},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(search_scenes))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Ranked scenes, clearest first", body = SearchResponse),
        (status = 400, description = "Missing or malformed bbox, dates or filters", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody),
        (status = 502, description = "Provider error", body = ErrorBody)
    ),
    summary = "Search satellite scenes",
    description = "Finds Sentinel-2 scenes intersecting a bounding box within a date range and cloud ceiling."
)]
pub async fn search_scenes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GeometryQuery::from_params(&params, state.config.max_cloud_coverage)?;
    let provider = state.provider()?;
    let scenes = resolver::search(provider, &query).await?;

    let body = SearchResponse {
        success: true,
        count: scenes.len(),
        scenes,
        bbox: query.area.bounds(),
        filters: SearchFilters {
            start_date: query.date_from,
            end_date: query.date_to,
            cloud_coverage: query.max_cloud_coverage,
            limit: query.limit,
        },
    };
    let cache_control = format!("public, max-age={}", state.config.search_cache_max_age);
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(body)))
}
