use super::models::{CreateZoningRequest, CreateZoningResponse, ZoningStatusResponse};
use super::tracker;
use crate::common::{
    error::{ApiError, ErrorBody},
    state::AppState,
};
use crate::routes::farms::fields;
use crate::routes::tasks::{
    models::{TaskKind, TaskParams, TaskStatus},
    orchestrator::{self, TaskRequest},
};
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{info, warn};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_zoning))
        .routes(routes!(zoning_status))
        .with_state(state.clone())
}

fn parse_uuid(name: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Validation(format!("{name} must be a UUID")))
}

#[utoipa::path(
    post,
    path = "/zoning/create",
    request_body = CreateZoningRequest,
    responses(
        (status = 200, description = "Zoning job created and recorded", body = CreateZoningResponse),
        (status = 400, description = "Missing fieldId or unsupported zoneQuantity", body = ErrorBody),
        (status = 404, description = "Field not found", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Create a productivity zoning map for a field"
)]
pub async fn create_zoning(
    State(state): State<AppState>,
    Json(request): Json<CreateZoningRequest>,
) -> Result<Json<CreateZoningResponse>, ApiError> {
    let request = TaskRequest::new(TaskKind::Zoning, TaskParams::from(request))?;
    let field_id = parse_uuid(
        "fieldId",
        request.params().field_id.as_deref().unwrap_or_default(),
    )?;
    let field = fields::find(&state.db, field_id).await?;
    let provider = state.provider()?;

    let task = orchestrator::create_task(provider, request).await?;
    let map = tracker::insert(&state.db, field.id, &task).await?;
    info!(
        field_id = %field.id,
        map_id = %map.id,
        zmap_id = %map.zmap_id,
        zones = map.zone_quantity,
        "Productivity map requested"
    );

    Ok(Json(CreateZoningResponse {
        success: true,
        zmap_id: map.zmap_id,
        task_id: map.task_id,
        productivity_map_id: map.id,
    }))
}

#[utoipa::path(
    get,
    path = "/zoning/status/{id}",
    params(("id" = Uuid, Path, description = "Productivity map id returned by create")),
    responses(
        (status = 200, description = "Current state of the map; zones once completed", body = ZoningStatusResponse),
        (status = 404, description = "Productivity map not found", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Poll a productivity zoning map"
)]
pub async fn zoning_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ZoningStatusResponse>, ApiError> {
    let map = tracker::find(&state.db, parse_uuid("id", &id)?).await?;

    // Settled maps are answered from storage without touching the provider
    match tracker::stored_status(&map) {
        TaskStatus::Completed if tracker::is_settled(&map) => {
            return Ok(Json(ZoningStatusResponse {
                success: true,
                status: TaskStatus::Completed,
                zones: tracker::stored_zones(&map),
                shapefile_url: map.shapefile_url,
                error: None,
                created_at: Some(map.created_at),
            }));
        }
        TaskStatus::Failed => {
            warn!(map_id = %map.id, "Returning stored zoning failure");
            return Ok(Json(ZoningStatusResponse {
                success: false,
                status: TaskStatus::Failed,
                zones: None,
                shapefile_url: None,
                error: Some(
                    map.error_message
                        .unwrap_or_else(|| "map generation failed".to_string()),
                ),
                created_at: Some(map.created_at),
            }));
        }
        _ => {}
    }

    let provider = state.provider()?;
    let progress = tracker::refresh(&state.db, provider, map).await?;
    Ok(Json(ZoningStatusResponse {
        success: true,
        status: progress.status,
        zones: progress.zones,
        shapefile_url: progress.row.shapefile_url,
        error: progress.error,
        created_at: Some(progress.row.created_at),
    }))
}
