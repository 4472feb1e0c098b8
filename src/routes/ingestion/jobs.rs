//! Scheduled ingestion runs. Items are processed one after another and a
//! failing item is recorded in the report without stopping the run.

use super::models::{
    FarmResult, FieldResult, ItemError, ItemStatus, MapResult, REFRESH_INDEX,
    REFRESH_LOOKBACK_DAYS, REFRESH_SCENE_LIMIT,
};
use crate::common::{error::ApiError, state::AppState};
use crate::provider::ProviderClient;
use crate::routes::analysis::{
    aggregator::{aggregate_snapshot, aggregate_weather},
    models::TaskOutcome,
    sources::{WEATHER_WINDOW_HOURS, fetch_scene_statistics, fetch_weather},
    store::{upsert_snapshots, upsert_weather_days},
};
use crate::routes::farms::{db as farm, fields};
use crate::routes::scenes::{
    models::{GeometryQuery, SceneRecord},
    resolver,
};
use crate::routes::zoning::tracker;
use chrono::{Duration, NaiveTime, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use tracing::{info, warn};

fn captured_at(scene: &SceneRecord) -> chrono::DateTime<Utc> {
    scene.date.and_time(NaiveTime::MIN).and_utc()
}

async fn refresh_field(
    state: &AppState,
    provider: &ProviderClient,
    field: &fields::db::Model,
) -> Result<u64, ApiError> {
    let area = fields::search_area(field)?;
    let mut query = GeometryQuery::new(area.clone());
    query.date_from = query.date_to - Duration::days(REFRESH_LOOKBACK_DAYS);
    query.limit = REFRESH_SCENE_LIMIT;
    query.max_cloud_coverage = state.config.max_cloud_coverage;

    let scenes = resolver::search(provider, &query).await?;
    let mut readings = Vec::with_capacity(scenes.len());
    for scene in &scenes {
        let stats = fetch_scene_statistics(provider, REFRESH_INDEX, &area, scene).await?;
        readings.push(aggregate_snapshot(
            field.id,
            &scene.id,
            TaskOutcome::Statistics(stats),
            REFRESH_INDEX,
            captured_at(scene),
            Some(scene.cloud_coverage),
        ));
    }
    upsert_snapshots(&state.db, &readings).await
}

/// Recent scenes and their index statistics for every located field.
pub async fn refresh_satellite(
    state: &AppState,
    provider: &ProviderClient,
) -> Result<Vec<FieldResult>, ApiError> {
    let located = Condition::any()
        .add(fields::db::Column::Boundary.is_not_null())
        .add(
            Condition::all()
                .add(fields::db::Column::Latitude.is_not_null())
                .add(fields::db::Column::Longitude.is_not_null()),
        );
    let rows = fields::db::Entity::find().filter(located).all(&state.db).await?;
    info!(fields = rows.len(), "Satellite refresh started");

    let mut results = Vec::with_capacity(rows.len());
    for field in &rows {
        let result = match refresh_field(state, provider, field).await {
            Ok(readings) => FieldResult {
                field_id: field.id,
                status: ItemStatus::Success,
                readings,
                error: None,
            },
            Err(e) => {
                warn!(field_id = %field.id, kind = %e.kind(), error = %e, "Field refresh failed");
                FieldResult {
                    field_id: field.id,
                    status: ItemStatus::Error,
                    readings: 0,
                    error: Some(ItemError::from(&e)),
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}

async fn ingest_farm_weather(
    state: &AppState,
    provider: &ProviderClient,
    farm: &farm::Model,
) -> Result<u64, ApiError> {
    let (latitude, longitude) = farm
        .coordinates()
        .ok_or_else(|| ApiError::Validation(format!("farm {} has no coordinates", farm.id)))?;
    let snapshots = fetch_weather(provider, latitude, longitude, WEATHER_WINDOW_HOURS).await?;
    let days = aggregate_weather(snapshots, farm.id, Utc::now());
    upsert_weather_days(&state.db, &days).await
}

/// Daily weather for every located farm.
pub async fn ingest_weather(
    state: &AppState,
    provider: &ProviderClient,
) -> Result<Vec<FarmResult>, ApiError> {
    let farms = farm::Entity::find()
        .filter(farm::Column::Latitude.is_not_null())
        .filter(farm::Column::Longitude.is_not_null())
        .all(&state.db)
        .await?;

    let mut results = Vec::with_capacity(farms.len());
    for farm in &farms {
        let result = match ingest_farm_weather(state, provider, farm).await {
            Ok(days) => FarmResult {
                farm_id: farm.id,
                status: ItemStatus::Success,
                days,
                error: None,
            },
            Err(e) => {
                warn!(farm_id = %farm.id, kind = %e.kind(), error = %e, "Weather ingestion failed");
                FarmResult {
                    farm_id: farm.id,
                    status: ItemStatus::Error,
                    days: 0,
                    error: Some(ItemError::from(&e)),
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}

/// One poll for every productivity map still running.
pub async fn check_productivity_maps(
    state: &AppState,
    provider: &ProviderClient,
) -> Result<Vec<MapResult>, ApiError> {
    let maps = tracker::unfinished(&state.db).await?;
    let mut results = Vec::with_capacity(maps.len());
    for map in maps {
        let map_id = map.id;
        let result = match tracker::refresh(&state.db, provider, map).await {
            Ok(progress) => MapResult {
                map_id,
                status: ItemStatus::Success,
                map_status: Some(progress.status),
                error: None,
            },
            Err(e) => {
                warn!(map_id = %map_id, kind = %e.kind(), error = %e, "Productivity map check failed");
                MapResult {
                    map_id,
                    status: ItemStatus::Error,
                    map_status: None,
                    error: Some(ItemError::from(&e)),
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}
