//! Persisted zoning jobs: one provider poll per refresh, terminal outcomes
//! written back to `productivity_map`.

use super::db;
use crate::common::error::ApiError;
use crate::provider::ProviderClient;
use crate::routes::analysis::{
    aggregator::{aggregate_snapshot, zones_from_payload},
    models::{TaskOutcome, Zone},
    store::{to_json, upsert_snapshots},
};
use crate::routes::tasks::{
    models::{RenderTask, TaskKind, TaskParams, TaskStatus},
    orchestrator,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// A map row together with what the latest poll reported.
#[derive(Debug)]
pub struct MapProgress {
    pub row: db::Model,
    pub status: TaskStatus,
    pub zones: Option<Vec<Zone>>,
    pub error: Option<String>,
}

pub fn stored_status(row: &db::Model) -> TaskStatus {
    TaskStatus::from_provider(&row.status)
}

pub fn stored_zones(row: &db::Model) -> Option<Vec<Zone>> {
    row.zones
        .clone()
        .and_then(|zones| serde_json::from_value(zones).ok())
}

/// Failed, or completed with zones stored. A completed map without zones is
/// polled again.
pub fn is_settled(row: &db::Model) -> bool {
    match stored_status(row) {
        TaskStatus::Failed => true,
        TaskStatus::Completed => row.zones.is_some(),
        _ => false,
    }
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<db::Model, ApiError> {
    db::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("productivity map not found".to_string()))
}

/// Maps that are not settled yet.
pub async fn unfinished(db: &DatabaseConnection) -> Result<Vec<db::Model>, ApiError> {
    let pending = Condition::any()
        .add(db::Column::Status.is_not_in([
            TaskStatus::Completed.as_ref(),
            TaskStatus::Failed.as_ref(),
        ]))
        .add(
            Condition::all()
                .add(db::Column::Status.eq(TaskStatus::Completed.as_ref()))
                .add(db::Column::Zones.is_null()),
        );
    Ok(db::Entity::find().filter(pending).all(db).await?)
}

pub async fn insert(
    db: &DatabaseConnection,
    field_id: Uuid,
    task: &RenderTask,
) -> Result<db::Model, ApiError> {
    let params = task.params();
    let now = Utc::now().fixed_offset();
    let row = db::ActiveModel {
        id: Set(Uuid::new_v4()),
        field_id: Set(field_id),
        zmap_id: Set(task.task_id().to_string()),
        task_id: Set(task.request_id().unwrap_or(task.task_id()).to_string()),
        vegetation_index: Set(params
            .vegetation_index
            .clone()
            .unwrap_or_else(|| "NDVI".to_string())),
        zone_quantity: Set(i32::from(params.zone_quantity.unwrap_or(5))),
        status: Set(task.status().as_ref().to_string()),
        zones: Set(None),
        shapefile_url: Set(None),
        error_message: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(row.insert(db).await?)
}

/// Polls the provider once for a map that is not settled. Completed maps
/// store their zones and shapefile URL and add a zone snapshot for the field;
/// failed maps store the error. Settled maps are returned as stored.
pub async fn refresh(
    db: &DatabaseConnection,
    provider: &ProviderClient,
    row: db::Model,
) -> Result<MapProgress, ApiError> {
    if is_settled(&row) {
        return Ok(MapProgress {
            zones: stored_zones(&row),
            error: row.error_message.clone(),
            status: stored_status(&row),
            row,
        });
    }

    let params = TaskParams {
        field_id: Some(row.field_id.to_string()),
        vegetation_index: Some(row.vegetation_index.clone()),
        ..Default::default()
    };
    let task = RenderTask::resume(TaskKind::Zoning, row.zmap_id.clone(), params);
    let task = orchestrator::poll_task(provider, task).await?;

    let zones = task.payload().and_then(zones_from_payload);
    let shapefile_url = task
        .payload()
        .and_then(|p| p.get("shapefile_download_url"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let now = Utc::now().fixed_offset();

    let row = match task.status() {
        TaskStatus::Completed => {
            let mut active: db::ActiveModel = row.into();
            active.status = Set(TaskStatus::Completed.as_ref().to_string());
            active.zones = Set(zones.as_ref().map(to_json).transpose()?);
            active.shapefile_url = Set(shapefile_url);
            active.updated_at = Set(now);
            let row = active.update(db).await?;

            if let Some(zones) = zones.clone() {
                let snapshot = aggregate_snapshot(
                    row.field_id,
                    &row.zmap_id,
                    TaskOutcome::Zones(zones),
                    &row.vegetation_index,
                    Utc::now(),
                    None,
                );
                upsert_snapshots(db, &[snapshot]).await?;
            }
            info!(map_id = %row.id, zmap_id = %row.zmap_id, "Productivity map completed");
            row
        }
        TaskStatus::Failed => {
            let mut active: db::ActiveModel = row.into();
            active.status = Set(TaskStatus::Failed.as_ref().to_string());
            active.error_message = Set(task.error().map(str::to_string));
            active.updated_at = Set(now);
            let row = active.update(db).await?;
            warn!(map_id = %row.id, error = ?row.error_message, "Productivity map failed");
            row
        }
        _ => row,
    };

    Ok(MapProgress {
        status: task.status(),
        zones,
        error: task.error().map(str::to_string),
        row,
    })
}
