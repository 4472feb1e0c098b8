use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Farms and fields are owned by the farm-management application. These
        // tables only carry the columns the imagery layer reads.
        manager
            .create_table(
                Table::create()
                    .table(Farm::Table)
                    .if_not_exists()
                    .col(uuid(Farm::Id).primary_key())
                    .col(string(Farm::Name))
                    .col(double_null(Farm::Latitude))
                    .col(double_null(Farm::Longitude))
                    .col(
                        timestamp_with_time_zone(Farm::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Field::Table)
                    .if_not_exists()
                    .col(uuid(Field::Id).primary_key())
                    .col(uuid(Field::FarmId))
                    .col(string(Field::Name))
                    .col(double_null(Field::Latitude))
                    .col(double_null(Field::Longitude))
                    .col(json_null(Field::Boundary))
                    .col(
                        timestamp_with_time_zone(Field::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_field_farm")
                            .from(Field::Table, Field::FarmId)
                            .to(Farm::Table, Farm::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_field_farm_id")
                    .table(Field::Table)
                    .col(Field::FarmId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Field::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Farm::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Farm {
    Table,
    Id,
    Name,
    Latitude,
    Longitude,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Field {
    Table,
    Id,
    FarmId,
    Name,
    Latitude,
    Longitude,
    Boundary,
    CreatedAt,
}
