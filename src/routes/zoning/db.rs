use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "productivity_map")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub field_id: Uuid,
    /// Provider map id, also the id the map is polled by
    pub zmap_id: String,
    pub task_id: String,
    pub vegetation_index: String,
    pub zone_quantity: i32,
    pub status: String,
    #[sea_orm(column_type = "Json", nullable)]
    pub zones: Option<Json>,
    pub shapefile_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::routes::farms::fields::db::Entity",
        from = "Column::FieldId",
        to = "crate::routes::farms::fields::db::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Field,
}

impl Related<crate::routes::farms::fields::db::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Field.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
