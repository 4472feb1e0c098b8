use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "field")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub farm_id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// GeoJSON Polygon (or Feature wrapping one)
    #[sea_orm(column_type = "Json", nullable)]
    pub boundary: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::routes::farms::db::Entity",
        from = "Column::FarmId",
        to = "crate::routes::farms::db::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Farm,
}

impl Related<crate::routes::farms::db::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farm.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
