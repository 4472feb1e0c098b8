use super::db as alert;
use super::models::{
    ALERT_STATUS_UNREAD, AnalyzeRequest, AnalyzeResponse, DiffRequest, DiffResponse,
    DiffTileParams,
};
use crate::common::{
    error::{ApiError, ErrorBody},
    state::AppState,
};
use crate::provider::ProviderClient;
use crate::routes::analysis::{
    aggregator::compare_statistics,
    models::{ChangeAnalysis, validate_index},
    sources::fetch_scene_statistics,
};
use crate::routes::farms::fields;
use crate::routes::scenes::{
    models::{GeometryQuery, SceneRecord, SearchArea, parse_date},
    resolver,
};
use crate::routes::tasks::{
    models::{TaskKind, TaskParams},
    orchestrator::{self, TaskRequest},
};
use crate::routes::tiles::{
    proxy::{self, TileKey},
    styling::diff_legend,
    views::parse_tile,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(diff_map))
        .routes(routes!(analyze_change))
        .routes(routes!(diff_tile))
        .with_state(state.clone())
}

#[utoipa::path(
    post,
    path = "/change-detection/diff",
    request_body = DiffRequest,
    responses(
        (status = 200, description = "Tile template for the difference map", body = DiffResponse),
        (status = 400, description = "viewId1 or viewId2 missing", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Difference map between two scenes"
)]
pub async fn diff_map(
    State(state): State<AppState>,
    Json(request): Json<DiffRequest>,
) -> Result<Json<DiffResponse>, ApiError> {
    let request = TaskRequest::new(TaskKind::Diff, TaskParams::from(request))?;
    validate_index(request.params().vegetation_index.as_deref().unwrap_or_default())?;
    let provider = state.provider()?;

    let task = orchestrator::create_task(provider, request).await?;
    let tile_url = task
        .result_url()
        .map(str::to_string)
        .ok_or_else(|| ApiError::Validation("diff task has no tile template".to_string()))?;

    Ok(Json(DiffResponse {
        success: true,
        tile_url,
        legend: diff_legend(),
    }))
}

async fn record_alert(
    db: &DatabaseConnection,
    field_id: Uuid,
    baseline: NaiveDate,
    comparison: NaiveDate,
    index: &str,
    analysis: &ChangeAnalysis,
) -> Result<Uuid, ApiError> {
    let row = alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        field_id: Set(field_id),
        baseline_date: Set(baseline),
        comparison_date: Set(comparison),
        change_percentage: Set(analysis.change_percentage),
        change_type: Set(analysis.change_type.as_ref().to_string()),
        vegetation_index: Set(index.to_string()),
        status: Set(ALERT_STATUS_UNREAD.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;
    Ok(row.id)
}

/// Best scene captured on `date` over the field, whatever its cloud cover.
async fn scene_on(
    provider: &ProviderClient,
    area: &SearchArea,
    date: NaiveDate,
) -> Result<SceneRecord, ApiError> {
    let mut query = GeometryQuery::new(area.clone());
    query.date_from = date;
    query.date_to = date;
    query.max_cloud_coverage = 100.0;
    let scenes = resolver::search(provider, &query).await?;
    resolver::best_on_date(&scenes, date)
}

#[utoipa::path(
    post,
    path = "/change-detection/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Relative change of the index mean between two days", body = AnalyzeResponse),
        (status = 400, description = "fieldId, date1 or date2 missing or malformed", body = ErrorBody),
        (status = 404, description = "Field not found, no scene on one of the days, or no data for the baseline day", body = ErrorBody),
        (status = 503, description = "Provider API key not configured", body = ErrorBody)
    ),
    summary = "Compare vegetation statistics between two days"
)]
pub async fn analyze_change(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (Some(field_id), Some(date1), Some(date2)) = (
        request.field_id.as_deref(),
        request.date1.as_deref(),
        request.date2.as_deref(),
    ) else {
        return Err(ApiError::Validation(
            "fieldId, date1 and date2 are required".to_string(),
        ));
    };
    let field_id = Uuid::parse_str(field_id.trim())
        .map_err(|_| ApiError::Validation("fieldId must be a UUID".to_string()))?;
    let baseline = parse_date("date1", date1)?;
    let comparison = parse_date("date2", date2)?;
    let index = request.index();
    validate_index(&index)?;

    let field = fields::find(&state.db, field_id).await?;
    let area = fields::search_area(&field)?;
    let provider = state.provider()?;

    let (baseline_scene, comparison_scene) = tokio::try_join!(
        scene_on(provider, &area, baseline),
        scene_on(provider, &area, comparison),
    )?;
    let (baseline_stats, comparison_stats) = tokio::try_join!(
        fetch_scene_statistics(provider, &index, &area, &baseline_scene),
        fetch_scene_statistics(provider, &index, &area, &comparison_scene),
    )?;
    let analysis = compare_statistics(&baseline_stats, &comparison_stats)?;

    let alert_id = if request.create_alert && analysis.is_significant {
        Some(record_alert(&state.db, field.id, baseline, comparison, &index, &analysis).await?)
    } else {
        None
    };
    info!(
        field_id = %field.id,
        index = %index,
        baseline_scene = %baseline_scene.id,
        comparison_scene = %comparison_scene.id,
        change = analysis.change_percentage,
        change_type = %analysis.change_type,
        significant = analysis.is_significant,
        alert = ?alert_id,
        "Change analysed"
    );

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
        alert_id,
    }))
}

#[utoipa::path(
    get,
    path = "/change-detection/tiles/{z}/{x}/{y}",
    params(
        ("z" = String, Path, description = "Zoom level"),
        ("x" = String, Path, description = "Tile x coordinate"),
        ("y" = String, Path, description = "Tile y coordinate"),
        DiffTileParams
    ),
    responses(
        (status = 200, description = "Difference tile, or a transparent PNG with X-Provider-Error headers", body = [u8], content_type = "image/png")
    ),
    summary = "Proxy a change-detection difference tile"
)]
pub async fn diff_tile(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
    Query(params): Query<DiffTileParams>,
) -> Response {
    let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
    let (Some(baseline_view), Some(comparison_view)) =
        (non_blank(&params.view_id_1), non_blank(&params.view_id_2))
    else {
        return proxy::no_identifier_response();
    };
    let index = params.index();
    let key = validate_index(&index)
        .and_then(|_| parse_tile(&z, &x, &y))
        .map(|coord| TileKey::Diff {
            baseline_view,
            comparison_view,
            index,
            coord,
        });
    proxy::serve_tile(&state, key).await
}
