// Database test utilities

use agri_imagery_api::routes::farms::{db as farm, fields::db as field};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set,
};
use serde_json::Value;
use uuid::Uuid;

/// Create a test SQLite database. Each connection to `:memory:` is a
/// separate database, so tests never see each other's rows.
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON").await?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| DbErr::Custom(format!("Migration failed: {}", e)))?;

    Ok(db)
}

pub async fn seed_farm(
    db: &DatabaseConnection,
    coordinates: Option<(f64, f64)>,
) -> Result<farm::Model, DbErr> {
    farm::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Test farm".to_string()),
        latitude: Set(coordinates.map(|c| c.0)),
        longitude: Set(coordinates.map(|c| c.1)),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
}

pub async fn seed_field(
    db: &DatabaseConnection,
    farm_id: Uuid,
    coordinates: Option<(f64, f64)>,
    boundary: Option<Value>,
) -> Result<field::Model, DbErr> {
    field::ActiveModel {
        id: Set(Uuid::new_v4()),
        farm_id: Set(farm_id),
        name: Set("North parcel".to_string()),
        latitude: Set(coordinates.map(|c| c.0)),
        longitude: Set(coordinates.map(|c| c.1)),
        boundary: Set(boundary),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
}

/// A located farm with one field drawn as a polygon.
pub async fn seed_farm_with_field(db: &DatabaseConnection) -> (farm::Model, field::Model) {
    let farm = seed_farm(db, Some((25.25, 32.55)))
        .await
        .expect("Failed to seed farm");
    let field = seed_field(db, farm.id, None, Some(super::fixtures::field_boundary()))
        .await
        .expect("Failed to seed field");
    (farm, field)
}
