//! Idempotent persistence of aggregates. Every write is a single
//! `INSERT ... ON CONFLICT DO UPDATE`, so re-running an ingestion supersedes
//! earlier rows instead of duplicating them.

use super::models::{AnalysisSnapshot, WeatherDayAggregate};
use super::{snapshots, weather};
use crate::common::error::ApiError;
use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set, sea_query::OnConflict};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Database(DbErr::Json(e.to_string())))
}

/// One row per (farm, day). Returns the number of days written.
pub async fn upsert_weather_days(
    db: &DatabaseConnection,
    days: &[WeatherDayAggregate],
) -> Result<u64, ApiError> {
    if days.is_empty() {
        return Ok(0);
    }
    let now = Utc::now().fixed_offset();
    let rows = days
        .iter()
        .map(|day| {
            Ok(weather::db::ActiveModel {
                id: Set(Uuid::new_v4()),
                farm_id: Set(day.farm_id),
                date: Set(day.date),
                temperature: Set(day.temperature),
                humidity: Set(day.humidity),
                wind_speed: Set(day.wind_speed),
                precipitation: Set(day.precipitation),
                weather_condition: Set(day.condition.clone()),
                snapshots: Set(to_json(&day.snapshots)?),
                sample_count: Set(i32::try_from(day.snapshots.len()).unwrap_or(i32::MAX)),
                updated_at: Set(now),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    weather::db::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([weather::db::Column::FarmId, weather::db::Column::Date])
                .update_columns([
                    weather::db::Column::Temperature,
                    weather::db::Column::Humidity,
                    weather::db::Column::WindSpeed,
                    weather::db::Column::Precipitation,
                    weather::db::Column::WeatherCondition,
                    weather::db::Column::Snapshots,
                    weather::db::Column::SampleCount,
                    weather::db::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    debug!(days = days.len(), "Weather days upserted");
    Ok(days.len() as u64)
}

/// One row per (field, scene, index).
pub async fn upsert_snapshots(
    db: &DatabaseConnection,
    readings: &[AnalysisSnapshot],
) -> Result<u64, ApiError> {
    if readings.is_empty() {
        return Ok(0);
    }
    let now = Utc::now().fixed_offset();
    let rows = readings
        .iter()
        .map(|reading| {
            Ok(snapshots::db::ActiveModel {
                id: Set(Uuid::new_v4()),
                field_id: Set(reading.field_id),
                scene_id: Set(reading.scene_id.clone()),
                index_type: Set(reading.index_type.clone()),
                mean: Set(reading.statistics.mean),
                min: Set(reading.statistics.min),
                max: Set(reading.statistics.max),
                std_dev: Set(reading.statistics.std_dev),
                cloud_coverage: Set(reading.cloud_coverage),
                captured_at: Set(reading.captured_at.fixed_offset()),
                zones: Set(reading.zones.as_ref().map(to_json).transpose()?),
                updated_at: Set(now),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    snapshots::db::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                snapshots::db::Column::FieldId,
                snapshots::db::Column::SceneId,
                snapshots::db::Column::IndexType,
            ])
            .update_columns([
                snapshots::db::Column::Mean,
                snapshots::db::Column::Min,
                snapshots::db::Column::Max,
                snapshots::db::Column::StdDev,
                snapshots::db::Column::CloudCoverage,
                snapshots::db::Column::CapturedAt,
                snapshots::db::Column::Zones,
                snapshots::db::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    debug!(readings = readings.len(), "Analysis snapshots upserted");
    Ok(readings.len() as u64)
}
