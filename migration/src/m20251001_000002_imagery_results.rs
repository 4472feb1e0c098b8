use crate::m20251001_000001_farm_schema::{Farm, Field};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeatherDay::Table)
                    .if_not_exists()
                    .col(uuid(WeatherDay::Id).primary_key())
                    .col(uuid(WeatherDay::FarmId))
                    .col(date(WeatherDay::Date))
                    .col(double_null(WeatherDay::Temperature))
                    .col(double_null(WeatherDay::Humidity))
                    .col(double_null(WeatherDay::WindSpeed))
                    .col(double_null(WeatherDay::Precipitation))
                    .col(string_null(WeatherDay::WeatherCondition))
                    .col(json(WeatherDay::Snapshots))
                    .col(integer(WeatherDay::SampleCount).default(0))
                    .col(timestamp_with_time_zone(WeatherDay::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weather_day_farm")
                            .from(WeatherDay::Table, WeatherDay::FarmId)
                            .to(Farm::Table, Farm::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Target of the ON CONFLICT upsert: one row per farm and calendar day
        manager
            .create_index(
                Index::create()
                    .name("idx_weather_day_farm_date")
                    .table(WeatherDay::Table)
                    .col(WeatherDay::FarmId)
                    .col(WeatherDay::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AnalysisSnapshot::Table)
                    .if_not_exists()
                    .col(uuid(AnalysisSnapshot::Id).primary_key())
                    .col(uuid(AnalysisSnapshot::FieldId))
                    .col(string(AnalysisSnapshot::SceneId))
                    .col(string(AnalysisSnapshot::IndexType))
                    .col(double_null(AnalysisSnapshot::Mean))
                    .col(double_null(AnalysisSnapshot::Min))
                    .col(double_null(AnalysisSnapshot::Max))
                    .col(double_null(AnalysisSnapshot::StdDev))
                    .col(double_null(AnalysisSnapshot::CloudCoverage))
                    .col(timestamp_with_time_zone(AnalysisSnapshot::CapturedAt))
                    .col(json_null(AnalysisSnapshot::Zones))
                    .col(timestamp_with_time_zone(AnalysisSnapshot::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_analysis_snapshot_field")
                            .from(AnalysisSnapshot::Table, AnalysisSnapshot::FieldId)
                            .to(Field::Table, Field::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_snapshot_field_scene_index")
                    .table(AnalysisSnapshot::Table)
                    .col(AnalysisSnapshot::FieldId)
                    .col(AnalysisSnapshot::SceneId)
                    .col(AnalysisSnapshot::IndexType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_snapshot_captured_at")
                    .table(AnalysisSnapshot::Table)
                    .col(AnalysisSnapshot::CapturedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnalysisSnapshot::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeatherDay::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeatherDay {
    Table,
    Id,
    FarmId,
    Date,
    Temperature,
    Humidity,
    WindSpeed,
    Precipitation,
    WeatherCondition,
    Snapshots,
    SampleCount,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AnalysisSnapshot {
    Table,
    Id,
    FieldId,
    SceneId,
    IndexType,
    Mean,
    Min,
    Max,
    StdDev,
    CloudCoverage,
    CapturedAt,
    Zones,
    UpdatedAt,
}
