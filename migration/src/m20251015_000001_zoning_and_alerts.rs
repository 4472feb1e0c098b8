use crate::m20251001_000001_farm_schema::Field;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductivityMap::Table)
                    .if_not_exists()
                    .col(uuid(ProductivityMap::Id).primary_key())
                    .col(uuid(ProductivityMap::FieldId))
                    .col(string(ProductivityMap::ZmapId))
                    .col(string(ProductivityMap::TaskId))
                    .col(string(ProductivityMap::VegetationIndex))
                    .col(integer(ProductivityMap::ZoneQuantity))
                    .col(string(ProductivityMap::Status).default("processing"))
                    .col(json_null(ProductivityMap::Zones))
                    .col(string_null(ProductivityMap::ShapefileUrl))
                    .col(string_null(ProductivityMap::ErrorMessage))
                    .col(timestamp_with_time_zone(ProductivityMap::CreatedAt))
                    .col(timestamp_with_time_zone(ProductivityMap::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_productivity_map_field")
                            .from(ProductivityMap::Table, ProductivityMap::FieldId)
                            .to(Field::Table, Field::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The scheduled run re-checks unfinished maps by status
        manager
            .create_index(
                Index::create()
                    .name("idx_productivity_map_status")
                    .table(ProductivityMap::Table)
                    .col(ProductivityMap::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChangeAlert::Table)
                    .if_not_exists()
                    .col(uuid(ChangeAlert::Id).primary_key())
                    .col(uuid(ChangeAlert::FieldId))
                    .col(date(ChangeAlert::BaselineDate))
                    .col(date(ChangeAlert::ComparisonDate))
                    .col(double(ChangeAlert::ChangePercentage))
                    .col(string(ChangeAlert::ChangeType))
                    .col(string(ChangeAlert::VegetationIndex))
                    .col(string(ChangeAlert::Status).default("unread"))
                    .col(timestamp_with_time_zone(ChangeAlert::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_change_alert_field")
                            .from(ChangeAlert::Table, ChangeAlert::FieldId)
                            .to(Field::Table, Field::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChangeAlert::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductivityMap::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductivityMap {
    Table,
    Id,
    FieldId,
    ZmapId,
    TaskId,
    VegetationIndex,
    ZoneQuantity,
    Status,
    Zones,
    ShapefileUrl,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ChangeAlert {
    Table,
    Id,
    FieldId,
    BaselineDate,
    ComparisonDate,
    ChangePercentage,
    ChangeType,
    VegetationIndex,
    Status,
    CreatedAt,
}
