pub use sea_orm_migration::prelude::*;

mod m20251001_000001_farm_schema;
mod m20251001_000002_imagery_results;
mod m20251015_000001_zoning_and_alerts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_farm_schema::Migration),
            Box::new(m20251001_000002_imagery_results::Migration),
            Box::new(m20251015_000001_zoning_and_alerts::Migration),
        ]
    }
}
