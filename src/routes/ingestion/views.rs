use super::auth::CronAuth;
use super::jobs;
use super::models::{AnalyticsReport, RefreshReport};
use crate::common::{
    error::{ApiError, ErrorBody},
    state::AppState,
};
use axum::{Json, extract::State};
use tracing::info;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(refresh_satellite))
        .routes(routes!(run_analytics))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/cron/refresh-satellite",
    responses(
        (status = 200, description = "Per-field outcome of the refresh", body = RefreshReport),
        (status = 401, description = "Missing or wrong bearer token", body = ErrorBody),
        (status = 503, description = "CRON_SECRET or provider API key not configured", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    summary = "Scheduled: record recent scene statistics for every field"
)]
pub async fn refresh_satellite(
    _auth: CronAuth,
    State(state): State<AppState>,
) -> Result<Json<RefreshReport>, ApiError> {
    let provider = state.provider()?;
    let report = RefreshReport::new(jobs::refresh_satellite(&state, provider).await?);
    info!(
        fields = report.fields_processed,
        readings = report.total_readings,
        "Satellite refresh finished"
    );
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/cron/analytics",
    responses(
        (status = 200, description = "Per-farm weather and per-map zoning outcomes", body = AnalyticsReport),
        (status = 401, description = "Missing or wrong bearer token", body = ErrorBody),
        (status = 503, description = "CRON_SECRET or provider API key not configured", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    summary = "Scheduled: ingest daily weather and advance pending zoning maps"
)]
pub async fn run_analytics(
    _auth: CronAuth,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let provider = state.provider()?;
    let farms = jobs::ingest_weather(&state, provider).await?;
    let maps = jobs::check_productivity_maps(&state, provider).await?;
    let report = AnalyticsReport::new(farms, maps);
    info!(
        farms = report.farms_processed,
        days = report.weather_days,
        maps = report.maps_checked,
        "Analytics run finished"
    );
    Ok(Json(report))
}
