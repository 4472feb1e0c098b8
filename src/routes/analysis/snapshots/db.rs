use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analysis_snapshot")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub field_id: Uuid,
    pub scene_id: String,
    pub index_type: String,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std_dev: Option<f64>,
    pub cloud_coverage: Option<f64>,
    pub captured_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Json", nullable)]
    pub zones: Option<Json>,
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
