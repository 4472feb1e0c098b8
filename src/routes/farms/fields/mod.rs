pub mod db;

use crate::common::error::ApiError;
use crate::routes::scenes::models::{BoundingBox, SearchArea};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

/// Half-width in degrees of the box searched around a field with no boundary.
pub const POINT_BUFFER_DEG: f64 = 0.01;

pub async fn find(db: &DatabaseConnection, field_id: Uuid) -> Result<db::Model, ApiError> {
    db::Entity::find_by_id(field_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("field {field_id} not found")))
}

/// Boundary polygon when one is stored, else a small box around the field's
/// point location.
pub fn search_area(field: &db::Model) -> Result<SearchArea, ApiError> {
    if let Some(boundary) = field.boundary.as_ref().filter(|b| !b.is_null()) {
        return SearchArea::from_geojson(boundary);
    }
    match (field.latitude, field.longitude) {
        (Some(lat), Some(lon)) => {
            let area = SearchArea::BoundingBox(BoundingBox::around(lat, lon, POINT_BUFFER_DEG));
            area.validate()?;
            Ok(area)
        }
        _ => Err(ApiError::Validation(format!(
            "field {} has neither a boundary nor coordinates",
            field.id
        ))),
    }
}
